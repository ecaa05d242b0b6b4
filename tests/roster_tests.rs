//! Roster import tests: upsert by roll number and what it reports.

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use valentine::models::prelude::Student;
use valentine::models::student;
use valentine::services::contact::{ContactDirectory, ContactResolvable};
use valentine::services::roster::{ImportSummary, Roster, RosterImporter};

mod common;
use common::{create_test_db, create_test_student, ROLL_DOMAIN};

async fn by_roll(db: &sea_orm::DatabaseConnection, roll: &str) -> student::Model {
    Student::find()
        .filter(student::Column::RollNumber.eq(roll))
        .one(db)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("no student with roll {}", roll))
}

#[tokio::test]
async fn test_import_creates_students_and_skips_bad_lines() {
    let db = create_test_db().await;
    let importer = RosterImporter::new(db.clone());

    let roster = Roster::parse("CS21B001,Asha Rao\nbroken line\nCS21B002,Bala Murugan\n\n");
    let summary = importer.import(&roster).await.unwrap();

    assert_eq!(
        summary,
        ImportSummary {
            processed: 2,
            skipped: 1,
            upserted: 2,
            modified: 0,
        }
    );

    let students = Student::find()
        .order_by_asc(student::Column::RollNumber)
        .all(&db)
        .await
        .unwrap();
    let names: Vec<_> = students.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Asha Rao", "Bala Murugan"]);

    // Roll-number-only students become reachable.
    let directory = ContactDirectory::new(ROLL_DOMAIN);
    assert_eq!(
        students[0].contact_address(&directory),
        Some(format!("cs21b001@{}", ROLL_DOMAIN))
    );
}

#[tokio::test]
async fn test_reimport_updates_names_without_duplicating() {
    let db = create_test_db().await;
    let importer = RosterImporter::new(db.clone());

    importer
        .import(&Roster::parse("CS21B001,Asha\nCS21B002,Bala\n"))
        .await
        .unwrap();
    let first = by_roll(&db, "CS21B001").await;

    let summary = importer
        .import(&Roster::parse("CS21B001,Asha Rao\nCS21B002,Bala\nCS21B003,Chitra\n"))
        .await
        .unwrap();

    assert_eq!(summary.upserted, 1);
    assert_eq!(summary.modified, 1);
    assert_eq!(Student::find().all(&db).await.unwrap().len(), 3);

    let updated = by_roll(&db, "CS21B001").await;
    assert_eq!(updated.id, first.id);
    assert_eq!(updated.name, "Asha Rao");
}

#[tokio::test]
async fn test_import_keeps_existing_email() {
    let db = create_test_db().await;
    let existing =
        create_test_student(&db, "Asha", Some("asha@example.com"), Some("CS21B001")).await;

    RosterImporter::new(db.clone())
        .import(&Roster::parse("CS21B001,Asha Rao\n"))
        .await
        .unwrap();

    let updated = by_roll(&db, "CS21B001").await;
    assert_eq!(updated.id, existing.id);
    assert_eq!(updated.email.as_deref(), Some("asha@example.com"));
    assert_eq!(updated.name, "Asha Rao");
}

#[tokio::test]
async fn test_plan_writes_nothing() {
    let db = create_test_db().await;
    let importer = RosterImporter::new(db.clone());

    let summary = importer
        .plan(&Roster::parse("CS21B001,Asha\nCS21B002,Bala\n"))
        .await
        .unwrap();

    assert_eq!(summary.upserted, 2);
    assert!(Student::find().all(&db).await.unwrap().is_empty());
}
