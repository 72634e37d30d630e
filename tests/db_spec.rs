use rocket_forge::db::{Database, DesignFilter, DesignStore};
use rocket_forge::models::*;
use speculate2::speculate;
use uuid::Uuid;

fn bulkhead() -> Component {
    Component {
        id: "bulkhead".to_string(),
        name: "Bulkhead".to_string(),
        kind: ComponentType::Bulkhead,
        section_id: "payload".to_string(),
        material: Some(Material::Cardstock),
        thickness_mm: 0.5,
        doubled: true,
        cutting_method: None,
        outline: vec![
            BezierControlPoint::new(0.0, 0.0),
            BezierControlPoint::new(38.0, 0.0),
            BezierControlPoint::new(38.0, 38.0),
            BezierControlPoint::new(0.0, 38.0),
            BezierControlPoint::new(0.0, 0.0),
        ],
        placement: Placement::default(),
        symmetry: Symmetry::default(),
        linked_components: Vec::new(),
        constraints: Vec::new(),
    }
}

fn test_design(owner: Uuid, name: &str, is_public: bool) -> Design {
    Design::from_input(
        owner,
        CreateDesignInput {
            name: name.to_string(),
            is_public,
            components: vec![bulkhead()],
            ..Default::default()
        },
    )
}

fn insert(db: &Database, owner: Uuid, name: &str, is_public: bool) -> Design {
    let design = test_design(owner, name, is_public);
    db.insert(&design).expect("Failed to insert design");
    design
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
        let owner = Uuid::new_v4();
    }

    describe "migrate" {
        it "is idempotent" {
            db.migrate().expect("Second migration run failed");
            assert_eq!(db.count(DesignFilter::Owner(owner)).unwrap(), 0);
        }
    }

    describe "insert and find" {
        it "round-trips the whole document" {
            let design = insert(&db, owner, "Alpha", false);

            let found = db.find(design.id).unwrap().expect("Design should exist");
            assert_eq!(found, design);
        }

        it "returns None for an unknown id" {
            assert!(db.find(Uuid::new_v4()).unwrap().is_none());
        }

        it "rejects a duplicate id" {
            let design = insert(&db, owner, "Alpha", false);
            assert!(db.insert(&design).is_err());
        }
    }

    describe "update" {
        it "replaces the document when the version matches" {
            let mut design = insert(&db, owner, "Alpha", false);
            design.name = "Beta".to_string();
            design.version = 2;

            assert!(db.update(&design, 1).unwrap());
            let found = db.find(design.id).unwrap().unwrap();
            assert_eq!(found.name, "Beta");
            assert_eq!(found.version, 2);
        }

        it "refuses a stale version" {
            let mut design = insert(&db, owner, "Alpha", false);
            design.version = 2;
            assert!(db.update(&design, 1).unwrap());

            design.name = "Stale".to_string();
            design.version = 2;
            assert!(!db.update(&design, 1).unwrap());
            assert_eq!(db.find(design.id).unwrap().unwrap().name, "Alpha");
        }

        it "reports a missing design as not updated" {
            let design = test_design(owner, "Ghost", false);
            assert!(!db.update(&design, 1).unwrap());
        }
    }

    describe "delete" {
        it "removes the design" {
            let design = insert(&db, owner, "Alpha", false);
            assert!(db.delete(design.id).unwrap());
            assert!(db.find(design.id).unwrap().is_none());
        }

        it "returns false when nothing was deleted" {
            assert!(!db.delete(Uuid::new_v4()).unwrap());
        }
    }

    describe "find_many" {
        it "scopes by owner" {
            insert(&db, owner, "Mine", false);
            insert(&db, Uuid::new_v4(), "Theirs", false);

            let designs = db
                .find_many(DesignFilter::Owner(owner), SortField::Name, SortDirection::Asc, 0, 10)
                .unwrap();
            assert_eq!(designs.len(), 1);
            assert_eq!(designs[0].name, "Mine");
            assert_eq!(db.count(DesignFilter::Owner(owner)).unwrap(), 1);
        }

        it "lists only public designs in the public scope" {
            insert(&db, owner, "Private", false);
            insert(&db, Uuid::new_v4(), "Shared", true);

            let designs = db
                .find_many(DesignFilter::Public, SortField::Name, SortDirection::Asc, 0, 10)
                .unwrap();
            assert_eq!(designs.len(), 1);
            assert_eq!(designs[0].name, "Shared");
            assert_eq!(db.count(DesignFilter::Public).unwrap(), 1);
        }

        it "sorts and pages" {
            for name in ["Charlie", "Alpha", "Delta", "Bravo"] {
                insert(&db, owner, name, false);
            }

            let first = db
                .find_many(DesignFilter::Owner(owner), SortField::Name, SortDirection::Asc, 0, 2)
                .unwrap();
            let second = db
                .find_many(DesignFilter::Owner(owner), SortField::Name, SortDirection::Asc, 2, 2)
                .unwrap();
            let names: Vec<_> = first.iter().chain(second.iter()).map(|d| d.name.as_str()).collect();
            assert_eq!(names, vec!["Alpha", "Bravo", "Charlie", "Delta"]);

            let desc = db
                .find_many(DesignFilter::Owner(owner), SortField::Name, SortDirection::Desc, 0, 1)
                .unwrap();
            assert_eq!(desc[0].name, "Delta");
        }

        it "returns an empty page past the end" {
            insert(&db, owner, "Alpha", false);
            let designs = db
                .find_many(DesignFilter::Owner(owner), SortField::UpdatedAt, SortDirection::Desc, 20, 20)
                .unwrap();
            assert!(designs.is_empty());
        }
    }
}
