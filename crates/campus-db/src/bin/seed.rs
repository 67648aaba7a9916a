//! # Seed Data Generator
//!
//! Populates the database with test courses and enrollments for development.
//!
//! ## Usage
//! ```bash
//! # Generate 40 courses and 25 students (default)
//! cargo run -p campus-db --bin seed
//!
//! # Generate custom amounts
//! cargo run -p campus-db --bin seed -- --courses 100 --students 60
//!
//! # Specify database path
//! cargo run -p campus-db --bin seed -- --db ./data/campus.db
//! ```
//!
//! ## Generated Data
//! Creates realistic courses across categories:
//! - Mathematics (calculus, algebra, statistics)
//! - Computing (programming, databases, networks)
//! - Literature, design, science
//!
//! Each course has:
//! - Unique code: `{SUBJECT}-{NUMBER}`
//! - Capacity: 20 - 50 seats
//! - Level cycling beginner/intermediate/advanced
//! - Advanced courses take the subject's intro course as a prerequisite
//!
//! Most courses are published; roughly one in five stays in draft. A cohort
//! of students then enrolls through the real admission path, some record
//! progress, and a few complete and leave feedback.

use chrono::Utc;
use std::collections::BTreeMap;
use std::env;

use tracing::Level;
use tracing_subscriber::EnvFilter;

use campus_core::{Course, CourseLevel, CourseStatus, Feedback};
use campus_db::repository::course::generate_course_id;
use campus_db::repository::feedback::generate_feedback_id;
use campus_db::{AdmitOutcome, Database, DbConfig};

/// Subjects with course titles for realistic test data.
const CATALOGUE: &[(&str, &str, &[&str])] = &[
    (
        "MATH",
        "mathematics",
        &[
            "Calculus I",
            "Linear Algebra",
            "Probability and Statistics",
            "Discrete Mathematics",
            "Real Analysis",
            "Number Theory",
            "Differential Equations",
            "Abstract Algebra",
        ],
    ),
    (
        "CS",
        "computing",
        &[
            "Introduction to Programming",
            "Data Structures",
            "Databases",
            "Operating Systems",
            "Computer Networks",
            "Compilers",
            "Distributed Systems",
            "Machine Learning",
        ],
    ),
    (
        "LIT",
        "literature",
        &[
            "World Literature",
            "Romantic Poetry",
            "The Modern Novel",
            "Creative Writing",
            "Literary Criticism",
            "Drama and Performance",
        ],
    ),
    (
        "DES",
        "design",
        &[
            "Design Fundamentals",
            "Typography",
            "Interaction Design",
            "Colour Theory",
            "Design Systems",
            "Motion Design",
        ],
    ),
    (
        "SCI",
        "science",
        &[
            "General Chemistry",
            "Classical Mechanics",
            "Cell Biology",
            "Thermodynamics",
            "Genetics",
            "Astronomy",
        ],
    ),
];

/// Weekly schedule slots assigned round-robin.
const SCHEDULES: &[&str] = &[
    "Mon/Wed 09:00",
    "Mon/Wed 11:00",
    "Tue/Thu 10:00",
    "Tue/Thu 14:00",
    "Fri 09:00-12:00",
];

const LEVELS: &[CourseLevel] = &[
    CourseLevel::Beginner,
    CourseLevel::Intermediate,
    CourseLevel::Advanced,
];

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=campus=trace` - Show trace for campus crates only
/// - Default: INFO level
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,campus=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::TRACE)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut course_count: usize = 40;
    let mut student_count: usize = 25;
    let mut db_path = String::from("./campus_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--courses" | "-c" => {
                if i + 1 < args.len() {
                    course_count = args[i + 1].parse().unwrap_or(40);
                    i += 1;
                }
            }
            "--students" | "-s" => {
                if i + 1 < args.len() {
                    student_count = args[i + 1].parse().unwrap_or(25);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Campus Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --courses <N>   Number of courses to generate (default: 40)");
                println!("  -s, --students <N>  Number of students to enroll (default: 25)");
                println!("  -d, --db <PATH>     Database file path (default: ./campus_dev.db)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Campus Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Courses:  {}", course_count);
    println!("Students: {}", student_count);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing courses
    let existing = db.courses().count(&Default::default()).await?;
    if existing > 0 {
        println!("⚠ Database already has {} courses", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Generate courses
    println!();
    println!("Generating courses...");

    let start = std::time::Instant::now();
    let mut generated = 0usize;
    let mut published_ids: Vec<String> = Vec::new();
    // First course per subject, used as the prerequisite for advanced ones.
    let mut intro_by_subject: BTreeMap<&str, String> = BTreeMap::new();

    'outer: for round in 0usize.. {
        for (subject, category, titles) in CATALOGUE {
            for (title_idx, title) in titles.iter().enumerate() {
                if generated >= course_count {
                    break 'outer;
                }

                let seed = generated;
                // MATH-101..108, then MATH-201.. on the next round, etc.
                let number = 101 + (round * 100 + title_idx) as i64;
                let level = LEVELS[seed % LEVELS.len()];

                let prerequisites = match (level, intro_by_subject.get(subject)) {
                    (CourseLevel::Advanced, Some(intro)) => vec![intro.clone()],
                    _ => vec![],
                };

                let course = generate_course(
                    subject,
                    category,
                    title,
                    number,
                    level,
                    prerequisites,
                    seed,
                );

                let inserted = db.courses().insert(&course).await?;
                intro_by_subject
                    .entry(*subject)
                    .or_insert_with(|| inserted.id.clone());

                // Roughly one in five stays in draft.
                if seed % 5 != 0 {
                    db.courses()
                        .transition_status(
                            &inserted.id,
                            CourseStatus::Draft,
                            CourseStatus::Published,
                        )
                        .await?;
                    published_ids.push(inserted.id.clone());
                }

                generated += 1;
                if generated % 25 == 0 {
                    println!("  Generated {} courses...", generated);
                }
            }
        }
    }

    println!("✓ Generated {} courses ({} published)", generated, published_ids.len());

    // Enroll students through the real admission path
    println!();
    println!("Enrolling students...");

    let mut enrollments = 0usize;
    let mut completions = 0usize;
    let mut ratings = 0usize;

    for s in 0..student_count {
        let student_id = format!("student-{:03}", s + 1);

        // Each student takes up to three distinct published courses.
        let mut taken: Vec<&String> = Vec::new();
        for pick in 0..3usize {
            if published_ids.is_empty() {
                break;
            }
            let course_id = &published_ids[(s * 7 + pick * 5) % published_ids.len()];
            if taken.contains(&course_id) {
                continue;
            }
            taken.push(course_id);

            let Some(enrollment) = admit_with_retry(&db, course_id, &student_id).await? else {
                continue;
            };
            enrollments += 1;

            // Two thirds record some progress.
            if (s + pick) % 3 != 0 {
                let percentage = ((s * 13 + pick * 29) % 101) as f64;
                let modules: Vec<String> = (0..(percentage as usize / 25))
                    .map(|m| format!("module-{}", m + 1))
                    .collect();
                db.progress()
                    .upsert(course_id, &student_id, percentage, &modules)
                    .await?;
            }

            // A few finish the course and leave feedback.
            if (s + pick) % 4 == 0 {
                db.enrollments()
                    .mark_completed(course_id, &student_id)
                    .await?;
                completions += 1;

                let rating = 3 + ((s + pick) % 3) as i64;
                let mut categories = BTreeMap::new();
                categories.insert("materials".to_string(), rating);
                categories.insert("pacing".to_string(), 3 + ((s + pick) % 2) as i64);

                db.feedback()
                    .insert(&Feedback {
                        id: generate_feedback_id(),
                        course_id: course_id.clone(),
                        student_id: enrollment.student_id.clone(),
                        rating,
                        comment: Some("Seeded review".to_string()),
                        categories,
                        submitted_at: Utc::now(),
                    })
                    .await?;
                ratings += 1;
            }
        }
    }

    let elapsed = start.elapsed();
    println!("✓ Enrolled {} seats ({} completed, {} rated)", enrollments, completions, ratings);
    println!();
    println!("✓ Seed complete in {:?}", elapsed);

    Ok(())
}

/// Runs the admission loop a service would run: read, CAS, retry on a miss.
async fn admit_with_retry(
    db: &Database,
    course_id: &str,
    student_id: &str,
) -> Result<Option<campus_core::Enrollment>, Box<dyn std::error::Error>> {
    for _ in 0..4 {
        let Some(course) = db.courses().get(course_id).await? else {
            return Ok(None);
        };
        if !course.has_seat() {
            return Ok(None);
        }

        match db
            .enrollments()
            .try_admit(course_id, course.version, student_id)
            .await?
        {
            AdmitOutcome::Admitted(enrollment) => return Ok(Some(enrollment)),
            AdmitOutcome::AlreadyActive(_) => return Ok(None),
            AdmitOutcome::SeatUnavailable => continue,
        }
    }
    Ok(None)
}

/// Generates a single course with deterministic pseudo-random attributes.
fn generate_course(
    subject: &str,
    category: &str,
    title: &str,
    number: i64,
    level: CourseLevel,
    prerequisites: Vec<String>,
    seed: usize,
) -> Course {
    let now = Utc::now();

    // Capacity 20-50 in steps of 10
    let capacity = 20 + ((seed * 7) % 4) as i64 * 10;

    Course {
        id: generate_course_id(),
        code: format!("{}-{}", subject, number),
        title: title.to_string(),
        description: Some(format!(
            "{} - a {} course in the {} catalogue.",
            title,
            match level {
                CourseLevel::Beginner => "beginner",
                CourseLevel::Intermediate => "intermediate",
                CourseLevel::Advanced => "advanced",
            },
            category
        )),
        status: CourseStatus::Draft,
        capacity,
        enrolled_count: 0,
        instructor_id: format!("teacher-{:02}", (seed % 6) + 1),
        prerequisites,
        credits: 3 + (seed % 3) as i64,
        schedule: Some(SCHEDULES[seed % SCHEDULES.len()].to_string()),
        category: Some(category.to_string()),
        level: Some(level),
        is_deleted: false,
        version: 1,
        created_at: now,
        updated_at: now,
    }
}
