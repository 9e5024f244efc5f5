use linkr_data::{PageMeta, PageRequest};

#[test]
fn numbered_navigation() {
    let page = PageRequest::numbered(2, 10);
    assert_eq!(page.offset(), 10);
    assert!(!page.is_first());
    assert_eq!(page.prev().unwrap().number(), Some(1));
    assert_eq!(page.next().number(), Some(3));
    assert_eq!(page.first().number(), Some(1));
    assert_eq!(page.last(95).number(), Some(10));
    assert_eq!(
        page.query_pairs(),
        vec![("page", "2".to_string()), ("limit", "10".to_string())]
    );
}

#[test]
fn first_page_has_no_prev() {
    assert!(PageRequest::numbered(1, 10).prev().is_none());
    assert!(PageRequest::at_offset(0, 10).prev().is_none());
}

#[test]
fn offset_navigation_clamps_at_zero() {
    let page = PageRequest::at_offset(5, 10);
    assert_eq!(page.prev().unwrap().offset(), 0);
    assert_eq!(page.next().offset(), 15);
    assert_eq!(page.last(0).offset(), 0);
    assert_eq!(page.last(30).offset(), 20);
    assert_eq!(
        page.query_pairs(),
        vec![("offset", "5".to_string()), ("limit", "10".to_string())]
    );
}

#[test]
fn meta_computes_total_pages() {
    let meta = PageMeta::new(PageRequest::numbered(1, 20), 20, true, Some(41));
    assert_eq!(meta.total_pages, Some(3));
    let meta = PageMeta::new(PageRequest::numbered(1, 20), 0, false, None);
    assert_eq!(meta.total_pages, None);
}
