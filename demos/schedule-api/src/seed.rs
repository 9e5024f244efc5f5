//! Demo data, served from memory or written into a SQLite database.

use linkr::linkr_data_sqlx::SqliteGateway;
use linkr::{MemoryGateway, Row};
use serde_json::Value;
use sqlx::SqlitePool;

struct CourseSeed {
    id: i64,
    title: &'static str,
    semester: &'static str,
    weekday: i64,
    start: &'static str,
    end: &'static str,
    sport: Option<i64>,
    hall: Option<i64>,
    teacher: Option<i64>,
}

const SPORTS: &[(i64, &str, &str)] = &[
    (1, "BAS", "Basketball"),
    (2, "VOL", "Volleyball"),
    (3, "YOG", "Yoga"),
];

const HALLS: &[(i64, &str, Option<&str>)] = &[
    (1, "Main Hall", Some("Campus Road 1")),
    (2, "Gym B", None),
];

// (id, first name, last name, email, email public, password)
const TEACHERS: &[(i64, &str, &str, &str, bool, &str)] = &[
    (1, "Ada", "Lovelace", "ada@uni.example", true, "$2b$12$ada"),
    (2, "Alan", "Turing", "alan@uni.example", false, "$2b$12$alan"),
];

const COURSES: &[CourseSeed] = &[
    CourseSeed {
        id: 1,
        title: "Basketball Beginners",
        semester: "2024S",
        weekday: 1,
        start: "18:00",
        end: "19:30",
        sport: Some(1),
        hall: Some(1),
        teacher: Some(1),
    },
    CourseSeed {
        id: 2,
        title: "Volleyball Mixed",
        semester: "2024S",
        weekday: 3,
        start: "19:00",
        end: "20:30",
        sport: Some(2),
        hall: Some(2),
        teacher: Some(2),
    },
    CourseSeed {
        id: 3,
        title: "Open Gym",
        semester: "2024S",
        weekday: 5,
        start: "16:00",
        end: "18:00",
        sport: None,
        hall: Some(2),
        teacher: None,
    },
    CourseSeed {
        id: 4,
        title: "Basketball Advanced",
        semester: "2024W",
        weekday: 2,
        start: "20:00",
        end: "21:30",
        sport: Some(1),
        hall: Some(1),
        teacher: Some(1),
    },
    CourseSeed {
        id: 5,
        title: "Morning Yoga",
        semester: "2024W",
        weekday: 4,
        start: "07:30",
        end: "08:30",
        sport: Some(3),
        hall: None,
        teacher: Some(2),
    },
];

const ENROLLMENTS: &[(i64, &str, i64)] = &[
    (1, "student-42", 1),
    (2, "student-42", 5),
    (3, "student-7", 2),
];

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sport (
    sp_id   INTEGER PRIMARY KEY,
    sp_code TEXT NOT NULL UNIQUE,
    sp_name TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS hall (
    h_id      INTEGER PRIMARY KEY,
    h_name    TEXT NOT NULL,
    h_address TEXT
);
CREATE TABLE IF NOT EXISTS teacher (
    t_id           INTEGER PRIMARY KEY,
    t_first_name   TEXT NOT NULL,
    t_last_name    TEXT NOT NULL,
    t_email        TEXT NOT NULL,
    t_email_public INTEGER NOT NULL DEFAULT 0,
    t_password     TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS course (
    c_id         INTEGER PRIMARY KEY,
    c_title      TEXT NOT NULL,
    c_semester   TEXT NOT NULL,
    c_weekday    INTEGER NOT NULL,
    c_start      TEXT NOT NULL,
    c_end        TEXT NOT NULL,
    c_sport_id   INTEGER REFERENCES sport (sp_id),
    c_hall_id    INTEGER REFERENCES hall (h_id),
    c_teacher_id INTEGER REFERENCES teacher (t_id)
);
CREATE TABLE IF NOT EXISTS enrollment (
    e_id        INTEGER PRIMARY KEY,
    e_student   TEXT NOT NULL,
    e_course_id INTEGER NOT NULL REFERENCES course (c_id)
);
CREATE VIEW IF NOT EXISTS v_course AS
    SELECT course.*, sport.sp_code AS sport_code
    FROM course LEFT JOIN sport ON sport.sp_id = course.c_sport_id;
"#;

fn sport_code(id: i64) -> Option<&'static str> {
    SPORTS.iter().find(|(sp_id, _, _)| *sp_id == id).map(|(_, code, _)| *code)
}

fn nullable<T: Into<Value>>(value: Option<T>) -> Value {
    value.map(Into::into).unwrap_or(Value::Null)
}

fn course_row(c: &CourseSeed) -> Row {
    Row::new()
        .with("c_id", c.id)
        .with("c_title", c.title)
        .with("c_semester", c.semester)
        .with("c_weekday", c.weekday)
        .with("c_start", c.start)
        .with("c_end", c.end)
        .with("c_sport_id", nullable(c.sport))
        .with("c_hall_id", nullable(c.hall))
        .with("c_teacher_id", nullable(c.teacher))
        .with("sport_code", nullable(c.sport.and_then(sport_code)))
}

/// The seed data as an in-memory gateway.
pub fn memory_gateway() -> MemoryGateway {
    let sports = SPORTS
        .iter()
        .map(|(id, code, name)| Row::new().with("sp_id", *id).with("sp_code", *code).with("sp_name", *name))
        .collect();
    let halls = HALLS
        .iter()
        .map(|(id, name, address)| {
            Row::new()
                .with("h_id", *id)
                .with("h_name", *name)
                .with("h_address", nullable(*address))
        })
        .collect();
    let teachers = TEACHERS
        .iter()
        .map(|(id, first, last, email, public, password)| {
            Row::new()
                .with("t_id", *id)
                .with("t_first_name", *first)
                .with("t_last_name", *last)
                .with("t_email", *email)
                .with("t_email_public", *public)
                .with("t_password", *password)
        })
        .collect();
    let enrollments = ENROLLMENTS
        .iter()
        .map(|(id, student, course)| {
            Row::new()
                .with("e_id", *id)
                .with("e_student", *student)
                .with("e_course_id", *course)
        })
        .collect();

    MemoryGateway::new()
        .with_table("sport", sports)
        .with_table("hall", halls)
        .with_table("teacher", teachers)
        .with_table("v_course", COURSES.iter().map(course_row).collect())
        .with_table("enrollment", enrollments)
}

/// Create the schema in `pool`, insert the seed data, and wrap the pool in a gateway.
///
/// Existing rows are kept; seeding an already seeded database is a no-op.
pub async fn sqlite_gateway(pool: SqlitePool) -> Result<SqliteGateway, sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(&pool).await?;

    for &(id, code, name) in SPORTS {
        sqlx::query("INSERT OR IGNORE INTO sport (sp_id, sp_code, sp_name) VALUES (?, ?, ?)")
            .bind(id)
            .bind(code)
            .bind(name)
            .execute(&pool)
            .await?;
    }
    for &(id, name, address) in HALLS {
        sqlx::query("INSERT OR IGNORE INTO hall (h_id, h_name, h_address) VALUES (?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(address)
            .execute(&pool)
            .await?;
    }
    for &(id, first, last, email, public, password) in TEACHERS {
        sqlx::query(
            "INSERT OR IGNORE INTO teacher \
             (t_id, t_first_name, t_last_name, t_email, t_email_public, t_password) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(first)
        .bind(last)
        .bind(email)
        .bind(public)
        .bind(password)
        .execute(&pool)
        .await?;
    }
    for c in COURSES {
        sqlx::query(
            "INSERT OR IGNORE INTO course \
             (c_id, c_title, c_semester, c_weekday, c_start, c_end, c_sport_id, c_hall_id, c_teacher_id) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(c.id)
        .bind(c.title)
        .bind(c.semester)
        .bind(c.weekday)
        .bind(c.start)
        .bind(c.end)
        .bind(c.sport)
        .bind(c.hall)
        .bind(c.teacher)
        .execute(&pool)
        .await?;
    }
    for &(id, student, course) in ENROLLMENTS {
        sqlx::query("INSERT OR IGNORE INTO enrollment (e_id, e_student, e_course_id) VALUES (?, ?, ?)")
            .bind(id)
            .bind(student)
            .bind(course)
            .execute(&pool)
            .await?;
    }

    tracing::info!(courses = COURSES.len(), "seeded SQLite schedule database");
    Ok(SqliteGateway::new(pool))
}
