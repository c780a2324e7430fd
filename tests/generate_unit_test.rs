//! Unit tests for value synthesis and constraint-aware generation.

use ahash::AHashSet;
use rand::rngs::StdRng;
use rand::SeedableRng;
use schema2db::error::{GenerateError, SynthError};
use schema2db::generate::{GenerateOptions, GeneratedDatabase, GeneratedTable, Generator};
use schema2db::preload::{Preload, PreloadSource};
use schema2db::schema::{parse_schema, ColumnDef, DataType, Schema};
use schema2db::synth;
use schema2db::value::Value;

fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

fn values_of(table: &GeneratedTable, column: &str) -> Vec<Value> {
    table.column_values(column).unwrap().cloned().collect()
}

fn generate(schema: &Schema, seed: u64) -> Result<GeneratedDatabase, GenerateError> {
    Generator::new(schema, rng(seed)).generate(Preload::new())
}

mod synth_tests {
    use super::*;

    #[test]
    fn test_random_value_by_type() {
        let mut rng = rng(1);
        let int = ColumnDef::new("n", DataType::Int).unsigned();
        let text = ColumnDef::new("s", DataType::Varchar).args(&[4]);
        let other = ColumnDef::new("o", DataType::Other("blob".into()));

        for _ in 0..100 {
            match synth::random_value(&mut rng, &int).unwrap() {
                Value::Int(n) => assert!((0..=synth::INT_BOUND).contains(&n)),
                v => panic!("unexpected {:?}", v),
            }
            match synth::random_value(&mut rng, &text).unwrap() {
                Value::Text(s) => assert!((1..=4).contains(&s.len())),
                v => panic!("unexpected {:?}", v),
            }
            match synth::random_value(&mut rng, &other).unwrap() {
                Value::Text(s) => assert!(s.len() <= synth::FALLBACK_TEXT_LENGTH as usize),
                v => panic!("unexpected {:?}", v),
            }
        }
    }

    #[test]
    fn test_argument_validation() {
        assert_eq!(
            synth::validate_args(&DataType::Varchar, &[]),
            Err(SynthError::Arity {
                datatype: "varchar".into(),
                expected: 1,
                found: 0,
            })
        );
        assert_eq!(
            synth::validate_args(&DataType::Varchar, &[0]),
            Err(SynthError::ZeroLength)
        );
        assert_eq!(
            synth::validate_args(&DataType::Decimal, &[2, 5]),
            Err(SynthError::DecimalPrecision {
                total: 2,
                fraction: 5
            })
        );
        assert!(synth::validate_args(&DataType::Decimal, &[5, 5]).is_ok());
        assert!(synth::validate_args(&DataType::Int, &[11]).is_ok());
    }

    #[test]
    fn test_random_list_len() {
        let column = ColumnDef::new("d", DataType::Date);
        assert_eq!(synth::random_list(&mut rng(2), &column, 17).unwrap().len(), 17);
    }
}

mod ordering_tests {
    use super::*;

    const CHAIN: &str = "CREATE TABLE a (\nid int,\nb_id int,\nPRIMARY KEY (id)\n);\n\
                         CREATE TABLE b (\nid int,\nc_id int,\nPRIMARY KEY (id)\n);\n\
                         CREATE TABLE c (\nid int,\nPRIMARY KEY (id)\n);\n\
                         ALTER TABLE a\nADD CONSTRAINT fk_a_b FOREIGN KEY (b_id) REFERENCES b(id);\n\
                         ALTER TABLE b\nADD CONSTRAINT fk_b_c FOREIGN KEY (c_id) REFERENCES c(id);";

    #[test]
    fn test_chain_generated_parents_first() {
        let schema = parse_schema(CHAIN).unwrap();
        let db = generate(&schema, 3).unwrap();

        assert_eq!(db.table_names().collect::<Vec<_>>(), ["c", "b", "a"]);

        let b_ids: AHashSet<Value> = values_of(db.get("b").unwrap(), "id").into_iter().collect();
        let c_ids: AHashSet<Value> = values_of(db.get("c").unwrap(), "id").into_iter().collect();
        let a = db.get("a").unwrap();
        let b = db.get("b").unwrap();

        assert!(!a.is_empty());
        assert!(values_of(a, "b_id").iter().all(|v| b_ids.contains(v)));
        assert!(values_of(b, "c_id").iter().all(|v| c_ids.contains(v)));
    }

    #[test]
    fn test_cycle_produces_nothing() {
        let schema = parse_schema(
            "CREATE TABLE a (\nid int,\nb_id int\n);\n\
             CREATE TABLE b (\nid int,\na_id int\n);\n\
             ALTER TABLE a\nADD CONSTRAINT fk_a_b FOREIGN KEY (b_id) REFERENCES b(id);\n\
             ALTER TABLE b\nADD CONSTRAINT fk_b_a FOREIGN KEY (a_id) REFERENCES a(id);",
        )
        .unwrap();
        assert!(matches!(
            generate(&schema, 4),
            Err(GenerateError::CircularDependency { .. })
        ));
    }

    #[test]
    fn test_same_seed_same_data() {
        let schema = parse_schema(CHAIN).unwrap();
        assert_eq!(generate(&schema, 42).unwrap(), generate(&schema, 42).unwrap());
    }
}

mod domain_tests {
    use super::*;

    #[test]
    fn test_enum_values_and_row_cap() {
        let schema = parse_schema(
            "CREATE TABLE t (\nid int,\nkind varchar(1)\n);\n\
             ALTER TABLE t\nADD CONSTRAINT chk_kind CHECK (kind IN ('x', 'y', 'z'));",
        )
        .unwrap();
        let db = generate(&schema, 5).unwrap();
        let t = db.get("t").unwrap();

        assert!(t.len() <= 3);
        let allowed = ["x", "y", "z"].map(|s| Value::Text(s.into()));
        assert!(values_of(t, "kind").iter().all(|v| allowed.contains(v)));
    }

    #[test]
    fn test_enum_values_coerced_to_column_type() {
        let schema = parse_schema(
            "CREATE TABLE t (\ngrade int\n);\n\
             ALTER TABLE t\nADD CONSTRAINT chk CHECK (grade IN (1, 2, 'x'));",
        )
        .unwrap();
        let db = generate(&schema, 6).unwrap();
        let allowed = [Value::Int(1), Value::Int(2), Value::Text("x".into())];
        assert!(values_of(db.get("t").unwrap(), "grade")
            .iter()
            .all(|v| allowed.contains(v)));
    }

    #[test]
    fn test_unknown_referenced_column() {
        let schema = parse_schema(
            "CREATE TABLE p (\nid int\n);\nCREATE TABLE c (\npid int\n);\n\
             ALTER TABLE c\nADD CONSTRAINT fk FOREIGN KEY (pid) REFERENCES p(missing);",
        )
        .unwrap();
        assert!(matches!(
            generate(&schema, 7),
            Err(GenerateError::UnknownColumn { ref column, .. }) if column == "missing"
        ));
    }

    #[test]
    fn test_empty_parent_is_empty_pool() {
        let schema = parse_schema(
            "CREATE TABLE p (\nid int\n);\nCREATE TABLE c (\npid int\n);\n\
             ALTER TABLE c\nADD CONSTRAINT fk FOREIGN KEY (pid) REFERENCES p(id);",
        )
        .unwrap();
        let mut preload = Preload::new();
        preload.insert(
            "p".into(),
            PreloadSource::Table(GeneratedTable::new(vec!["id".into()], vec![])),
        );

        let result = Generator::new(&schema, rng(8)).generate(preload);
        assert!(matches!(
            result,
            Err(GenerateError::EmptyChoicePool { ref table, .. }) if table == "c"
        ));
    }

    #[test]
    fn test_preloaded_text_pool_coerced_to_column_type() {
        let schema = parse_schema(
            "CREATE TABLE orders (\nlegacy_id int\n);\n\
             ALTER TABLE orders\nADD CONSTRAINT fk FOREIGN KEY (legacy_id) REFERENCES legacy(userid);",
        )
        .unwrap();
        let rows = ["7", "8", ""].iter().map(|s| vec![Value::Text(s.to_string())]).collect();
        let mut preload = Preload::new();
        preload.insert(
            "legacy".into(),
            PreloadSource::Table(GeneratedTable::new(vec!["userid".into()], rows)),
        );

        let db = Generator::new(&schema, rng(19)).generate(preload).unwrap();
        let ids = values_of(db.get("orders").unwrap(), "legacy_id");
        assert!(!ids.is_empty());
        assert!(ids.iter().all(|v| matches!(v, Value::Int(7) | Value::Int(8))));
    }

    #[test]
    fn test_invalid_decimal_arguments() {
        let schema = parse_schema("CREATE TABLE t (\nprice decimal(2, 5)\n);").unwrap();
        match generate(&schema, 9) {
            Err(GenerateError::InvalidArguments {
                table,
                column,
                source,
            }) => {
                assert_eq!((table.as_str(), column.as_str()), ("t", "price"));
                assert_eq!(
                    source,
                    SynthError::DecimalPrecision {
                        total: 2,
                        fraction: 5
                    }
                );
            }
            other => panic!("expected invalid arguments, got {:?}", other),
        }
    }
}

mod primary_key_tests {
    use super::*;

    fn assert_unique(values: &[Value]) {
        let distinct: AHashSet<&Value> = values.iter().collect();
        assert_eq!(distinct.len(), values.len(), "duplicates in {:?}", values);
    }

    #[test]
    fn test_unbounded_pk_unique_and_whitespace_free() {
        // Only 26 distinct one-letter keys exist
        let schema =
            parse_schema("CREATE TABLE t (\ncode varchar(1),\nPRIMARY KEY (code)\n);").unwrap();
        let db = generate(&schema, 10).unwrap();
        let codes = values_of(db.get("t").unwrap(), "code");

        assert!(!codes.is_empty() && codes.len() <= 26);
        assert_unique(&codes);
        assert!(codes
            .iter()
            .all(|v| matches!(v, Value::Text(s) if !s.contains(' ') && !s.is_empty())));
    }

    #[test]
    fn test_enum_pk_deduplicated() {
        let schema = parse_schema(
            "CREATE TABLE t (\nkind varchar(1),\nPRIMARY KEY (kind)\n);\n\
             ALTER TABLE t\nADD CONSTRAINT chk CHECK (kind IN ('a', 'a', 'b', 'b', 'c'));",
        )
        .unwrap();
        let db = generate(&schema, 11).unwrap();
        let kinds = values_of(db.get("t").unwrap(), "kind");
        assert_eq!(kinds.len(), 3);
        assert_unique(&kinds);
    }

    #[test]
    fn test_fk_pk_from_preloaded_pool_with_duplicates() {
        let schema = parse_schema(
            "CREATE TABLE parent (\nid int\n);\n\
             CREATE TABLE child (\npid int,\nlabel varchar(5),\nPRIMARY KEY (pid)\n);\n\
             ALTER TABLE child\nADD CONSTRAINT fk FOREIGN KEY (pid) REFERENCES parent(id);",
        )
        .unwrap();
        let rows = [1, 1, 2, 2, 3, 3, 3]
            .iter()
            .map(|&n| vec![Value::Int(n)])
            .chain(std::iter::once(vec![Value::Blank]))
            .collect();
        let mut preload = Preload::new();
        preload.insert(
            "parent".into(),
            PreloadSource::Table(GeneratedTable::new(vec!["id".into()], rows)),
        );

        let db = Generator::new(&schema, rng(12)).generate(preload).unwrap();
        assert_eq!(db.table_names().collect::<Vec<_>>(), ["parent", "child"]);

        let child = db.get("child").unwrap();
        let pids = values_of(child, "pid");
        assert_eq!(pids.len(), 3);
        assert_unique(&pids);
        assert!(pids.iter().all(|v| !v.is_blank()));
        // Later columns follow the capped row count
        assert_eq!(values_of(child, "label").len(), 3);
    }
}

mod exclusivity_tests {
    use super::*;

    const ACCOUNTS: &str = "CREATE TABLE users (\nid int,\nPRIMARY KEY (id)\n);\n\
                            CREATE TABLE customers (\nuserid int,\nname varchar(8)\n);\n\
                            CREATE TABLE vendors (\nuserid int,\nname varchar(8)\n);\n\
                            ALTER TABLE customers\nADD CONSTRAINT fk_c FOREIGN KEY (userid) REFERENCES users(id);\n\
                            ALTER TABLE vendors\nADD CONSTRAINT fk_v FOREIGN KEY (userid) REFERENCES users(id);";

    #[test]
    fn test_peers_never_share_values() {
        let mut schema = parse_schema(ACCOUNTS).unwrap();
        schema
            .register_exclusivity(&["customers", "vendors"], &["userid"])
            .unwrap();

        for seed in 0..5 {
            let db = generate(&schema, seed).unwrap();
            let customers: AHashSet<Value> = values_of(db.get("customers").unwrap(), "userid")
                .into_iter()
                .collect();
            let vendors = values_of(db.get("vendors").unwrap(), "userid");

            assert!(!customers.is_empty());
            assert!(!vendors.is_empty());
            assert!(vendors.iter().all(|v| !customers.contains(v)));
        }
    }

    #[test]
    fn test_first_peer_leaves_room_for_second() {
        let mut schema = parse_schema(ACCOUNTS).unwrap();
        schema
            .register_exclusivity(&["customers", "vendors"], &["userid"])
            .unwrap();

        let db = Generator::new(&schema, rng(13))
            .with_options(GenerateOptions {
                rows: 10,
                ..GenerateOptions::default()
            })
            .generate(Preload::new())
            .unwrap();
        // Half of the 10 user ids are reserved for the unprocessed peer
        assert!(db.get("customers").unwrap().len() <= 5);
        assert!(!db.get("vendors").unwrap().is_empty());
    }

    #[test]
    fn test_unbounded_peers_filtered_after_synthesis() {
        let mut schema = parse_schema(
            "CREATE TABLE a (\ncode varchar(1)\n);\nCREATE TABLE b (\ncode varchar(1)\n);",
        )
        .unwrap();
        schema.register_exclusivity(&["a", "b"], &["code"]).unwrap();

        let db = Generator::new(&schema, rng(16))
            .with_options(GenerateOptions {
                rows: 60,
                ..GenerateOptions::default()
            })
            .generate(Preload::new())
            .unwrap();
        let a: AHashSet<Value> = values_of(db.get("a").unwrap(), "code").into_iter().collect();
        let b = db.get("b").unwrap();

        // 60 draws over 27 one-character strings leave little for b
        assert_eq!(db.get("a").unwrap().len(), 60);
        assert!(b.len() < 60);
        assert!(values_of(b, "code").iter().all(|v| !a.contains(v)));
    }

    #[test]
    fn test_overlapping_groups_keep_later_peers_apart() {
        let letters = "'p', 'q', 'r', 's', 't', 'u', 'v', 'w'";
        let mut schema = parse_schema(&format!(
            "CREATE TABLE a (\nkind varchar(1)\n);\nCREATE TABLE b (\nkind varchar(1)\n);\n\
             CREATE TABLE c (\nkind varchar(1)\n);\n\
             ALTER TABLE a\nADD CONSTRAINT chk_a CHECK (kind IN ({letters}));\n\
             ALTER TABLE b\nADD CONSTRAINT chk_b CHECK (kind IN ({letters}));\n\
             ALTER TABLE c\nADD CONSTRAINT chk_c CHECK (kind IN ({letters}));"
        ))
        .unwrap();
        schema.register_exclusivity(&["a", "b"], &["kind"]).unwrap();
        schema.register_exclusivity(&["b", "c"], &["kind"]).unwrap();

        for seed in 0..20 {
            let db = generate(&schema, seed).unwrap();
            let b: AHashSet<Value> = values_of(db.get("b").unwrap(), "kind").into_iter().collect();
            let c = values_of(db.get("c").unwrap(), "kind");
            assert!(c.iter().all(|v| !b.contains(v)), "seed {}", seed);
        }
    }

    #[test]
    fn test_preloaded_text_peer_excludes_typed_values() {
        let mut schema = parse_schema(
            "CREATE TABLE customers (\nkind int\n);\n\
             ALTER TABLE customers\nADD CONSTRAINT chk CHECK (kind IN (1, 2, 3, 4));",
        )
        .unwrap();
        schema
            .register_exclusivity(&["legacy", "customers"], &["kind"])
            .unwrap();
        let rows = ["1", "2"].iter().map(|s| vec![Value::Text(s.to_string())]).collect();
        let mut preload = Preload::new();
        preload.insert(
            "legacy".into(),
            PreloadSource::Table(GeneratedTable::new(vec!["kind".into()], rows)),
        );

        let db = Generator::new(&schema, rng(17)).generate(preload).unwrap();
        let kinds = values_of(db.get("customers").unwrap(), "kind");
        assert!(!kinds.is_empty());
        assert!(kinds.iter().all(|v| matches!(v, Value::Int(3) | Value::Int(4))));
    }

    #[test]
    fn test_unknown_peer_does_not_reserve_values() {
        let mut schema = parse_schema(ACCOUNTS).unwrap();
        schema
            .register_exclusivity(&["customers", "vendorz"], &["userid"])
            .unwrap();

        let db = Generator::new(&schema, rng(18))
            .with_options(GenerateOptions {
                rows: 10,
                ..GenerateOptions::default()
            })
            .generate(Preload::new())
            .unwrap();
        assert_eq!(db.get("users").unwrap().len(), 10);
        assert_eq!(db.get("customers").unwrap().len(), 10);
    }

    #[test]
    fn test_exhausted_domain_is_error() {
        let mut schema = parse_schema(
            "CREATE TABLE a (\nkind varchar(1)\n);\nCREATE TABLE b (\nkind varchar(1)\n);\n\
             ALTER TABLE a\nADD CONSTRAINT chk_a CHECK (kind IN ('x'));\n\
             ALTER TABLE b\nADD CONSTRAINT chk_b CHECK (kind IN ('x'));",
        )
        .unwrap();
        schema.register_exclusivity(&["a", "b"], &["kind"]).unwrap();

        assert!(matches!(
            generate(&schema, 14),
            Err(GenerateError::EmptyChoicePool { ref table, .. }) if table == "b"
        ));
    }
}

mod null_tests {
    use super::*;

    const NULLABLE: &str = "CREATE TABLE t (\nid int NOT NULL,\nnote varchar(5) NULL,\nplain int,\nPRIMARY KEY (id)\n);";

    fn generate_with_keep(keep_probability: f64) -> GeneratedTable {
        let schema = parse_schema(NULLABLE).unwrap();
        let db = Generator::new(&schema, rng(15))
            .with_options(GenerateOptions {
                rows: 30,
                keep_probability,
            })
            .generate(Preload::new())
            .unwrap();
        db.get("t").unwrap().clone()
    }

    #[test]
    fn test_only_null_columns_are_blanked() {
        let t = generate_with_keep(0.0);
        assert_eq!(t.len(), 30);
        assert!(values_of(&t, "note").iter().all(Value::is_blank));
        assert!(values_of(&t, "id").iter().all(|v| !v.is_blank()));
        assert!(values_of(&t, "plain").iter().all(|v| !v.is_blank()));
    }

    #[test]
    fn test_keep_all() {
        let t = generate_with_keep(1.0);
        assert!(values_of(&t, "note").iter().all(|v| !v.is_blank()));
    }

    #[test]
    fn test_default_keep_rate() {
        let schema = parse_schema(NULLABLE).unwrap();
        let db = Generator::new(&schema, rng(20))
            .with_options(GenerateOptions {
                rows: 1000,
                ..GenerateOptions::default()
            })
            .generate(Preload::new())
            .unwrap();
        let notes = values_of(db.get("t").unwrap(), "note");
        assert_eq!(notes.len(), 1000);

        let blank_rate = notes.iter().filter(|v| v.is_blank()).count() as f64 / 1000.0;
        let expected = 1.0 - synth::DEFAULT_KEEP_PROBABILITY;
        assert!(
            (blank_rate - expected).abs() < 0.06,
            "blank rate {} outside band around {}",
            blank_rate,
            expected
        );
    }
}
