//! `Accept` header negotiation.

use std::sync::Arc;

use crate::envelope::EnvelopeSerializer;
use crate::error::HalError;

struct MediaRange<'a> {
    kind: &'a str,
    subtype: &'a str,
    q: f32,
    order: usize,
}

impl<'a> MediaRange<'a> {
    fn parse(order: usize, raw: &'a str) -> Option<Self> {
        let mut parts = raw.split(';');
        let range = parts.next()?.trim();
        let (kind, subtype) = range.split_once('/')?;
        let (kind, subtype) = (kind.trim(), subtype.trim());
        if kind.is_empty() || subtype.is_empty() || (kind == "*" && subtype != "*") {
            return None;
        }
        let q = parts
            .filter_map(|p| p.split_once('='))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("q"))
            .map(|(_, value)| value.trim().parse::<f32>().unwrap_or(0.0))
            .unwrap_or(1.0)
            .clamp(0.0, 1.0);
        Some(Self { kind, subtype, q, order })
    }

    fn is_exact(&self) -> bool {
        self.kind != "*" && self.subtype != "*"
    }

    fn matches(&self, media_type: &str) -> bool {
        let Some((kind, subtype)) = media_type.split_once('/') else {
            return false;
        };
        (self.kind == "*" || self.kind.eq_ignore_ascii_case(kind))
            && (self.subtype == "*" || self.subtype.eq_ignore_ascii_case(subtype))
    }

    /// Exact ranges outrank `type/*`, which outranks `*/*`.
    fn specificity(&self) -> u8 {
        match (self.kind, self.subtype) {
            ("*", _) => 0,
            (_, "*") => 1,
            _ => 2,
        }
    }
}

/// Picks a serializer for a request from its `Accept` header.
///
/// The first registered serializer is the default, used when the header is
/// absent or accepts anything.
#[derive(Clone)]
pub struct ContentNegotiator {
    serializers: Vec<Arc<dyn EnvelopeSerializer>>,
}

impl ContentNegotiator {
    /// # Errors
    ///
    /// `HalError::Config` when no serializer is given or two share a media type.
    pub fn new(serializers: Vec<Arc<dyn EnvelopeSerializer>>) -> Result<Self, HalError> {
        if serializers.is_empty() {
            return Err(HalError::Config("at least one envelope serializer is required".into()));
        }
        for (i, s) in serializers.iter().enumerate() {
            if serializers[..i].iter().any(|o| o.media_type() == s.media_type()) {
                return Err(HalError::Config(format!(
                    "media type '{}' registered twice",
                    s.media_type()
                )));
            }
        }
        Ok(Self { serializers })
    }

    /// Media types this negotiator can produce, default first.
    pub fn offered(&self) -> Vec<String> {
        self.serializers.iter().map(|s| s.media_type().to_string()).collect()
    }

    /// # Errors
    ///
    /// `HalError::NotAcceptable` listing [`offered`](Self::offered) types.
    pub fn select(&self, accept: Option<&str>) -> Result<Arc<dyn EnvelopeSerializer>, HalError> {
        let accept = accept.map(str::trim).unwrap_or_default();
        if accept.is_empty() {
            return Ok(self.serializers[0].clone());
        }

        let mut ranges: Vec<MediaRange<'_>> = accept
            .split(',')
            .enumerate()
            .filter_map(|(i, raw)| MediaRange::parse(i, raw))
            .collect();
        ranges.sort_by(|a, b| {
            b.q.total_cmp(&a.q)
                .then(b.specificity().cmp(&a.specificity()))
                .then(a.order.cmp(&b.order))
        });

        // q of the most specific range matching a media type decides its quality.
        let quality = |media_type: &str| {
            ranges
                .iter()
                .filter(|r| r.matches(media_type))
                .max_by_key(|r| r.specificity())
                .map(|r| r.q)
                .unwrap_or(0.0)
        };

        for range in ranges.iter().filter(|r| r.q > 0.0) {
            let candidate = self
                .serializers
                .iter()
                .find(|s| range.matches(s.media_type()) && (range.is_exact() || quality(s.media_type()) > 0.0));
            if let Some(serializer) = candidate {
                tracing::debug!(media_type = serializer.media_type(), "negotiated representation");
                return Ok(serializer.clone());
            }
        }

        Err(HalError::NotAcceptable {
            offered: self.offered(),
        })
    }
}

impl std::fmt::Debug for ContentNegotiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentNegotiator")
            .field("offered", &self.offered())
            .finish()
    }
}
