#[cfg(test)]
mod models_tests {
    use crate::archive::models::{ClassName, Header, Key, NibArchive, Object, Value, ValueData};
    use crate::error::archive::NibArchiveError;

    fn empty_header() -> Header {
        Header {
            unknown_1: 0,
            unknown_2: 0,
            object_count: 0,
            objects_offset: 0,
            key_count: 0,
            keys_offset: 0,
            value_count: 0,
            values_offset: 0,
            class_name_count: 0,
            class_names_offset: 0,
        }
    }

    fn key(name: &str) -> Key {
        Key {
            name: name.to_string(),
        }
    }

    fn sample_archive() -> NibArchive {
        NibArchive::new(
            empty_header(),
            vec![
                Object {
                    class_name_index: 0,
                    values_index: 0,
                    value_count: 2,
                },
                Object {
                    class_name_index: 1,
                    values_index: 2,
                    value_count: 0,
                },
            ],
            vec![key("NSName"), key("NSFlags")],
            vec![
                Value {
                    key_index: 0,
                    data: ValueData::Int32(1),
                },
                Value {
                    key_index: 1,
                    data: ValueData::Bool(true),
                },
                Value {
                    key_index: 5,
                    data: ValueData::Nil,
                },
            ],
            vec![
                ClassName {
                    name: "NSView".to_string(),
                    extras: vec![],
                },
                ClassName {
                    name: "NSButton".to_string(),
                    extras: vec![3],
                },
            ],
        )
    }

    #[test]
    fn test_object_values_window() {
        let archive = sample_archive();
        let object = &archive.objects()[0];

        let values = archive.object_values(object).unwrap();
        assert_eq!(values, &archive.values()[0..2]);
    }

    #[test]
    fn test_object_values_out_of_range() {
        let archive = sample_archive();
        let object = Object {
            class_name_index: 0,
            values_index: 1,
            value_count: 5,
        };

        let result = archive.object_values(&object);
        assert!(matches!(
            result,
            Err(NibArchiveError::IndexOutOfRange("values", 6, 3))
        ));
    }

    #[test]
    fn test_object_items() {
        let archive = sample_archive();
        let object = &archive.objects()[0];

        let items = archive.object_items(object).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(
            items.get(&key("NSName")).copied(),
            Some(&archive.values()[0])
        );
        assert_eq!(
            items.get(&key("NSFlags")).copied(),
            Some(&archive.values()[1])
        );
    }

    #[test]
    fn test_object_items_empty() {
        let archive = sample_archive();
        let object = &archive.objects()[1];

        let items = archive.object_items(object).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_object_items_bad_key_index() {
        let archive = sample_archive();
        let object = Object {
            class_name_index: 0,
            values_index: 2,
            value_count: 1,
        };

        let result = archive.object_items(&object);
        assert!(matches!(
            result,
            Err(NibArchiveError::IndexOutOfRange("keys", 5, 2))
        ));
    }

    #[test]
    fn test_object_items_duplicate_key_last_write_wins() {
        // The format leaves duplicate key indices within one object's window
        // undefined; this pins the documented assumption
        let archive = NibArchive::new(
            empty_header(),
            vec![Object {
                class_name_index: 0,
                values_index: 0,
                value_count: 2,
            }],
            vec![key("NSName")],
            vec![
                Value {
                    key_index: 0,
                    data: ValueData::Int8(1),
                },
                Value {
                    key_index: 0,
                    data: ValueData::Int8(2),
                },
            ],
            vec![ClassName {
                name: "NSView".to_string(),
                extras: vec![],
            }],
        );

        let items = archive.object_items(&archive.objects()[0]).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(
            items.get(&key("NSName")).map(|value| &value.data),
            Some(&ValueData::Int8(2))
        );
    }

    #[test]
    fn test_value_key() {
        let archive = sample_archive();

        let found = archive.value_key(&archive.values()[1]).unwrap();
        assert_eq!(found, &key("NSFlags"));

        let result = archive.value_key(&archive.values()[2]);
        assert!(matches!(
            result,
            Err(NibArchiveError::IndexOutOfRange("keys", 5, 2))
        ));
    }

    #[test]
    fn test_class_name() {
        let archive = sample_archive();

        let class = archive.class_name(&archive.objects()[1]).unwrap();
        assert_eq!(class.name, "NSButton");
        assert_eq!(class.extras, vec![3]);

        let object = Object {
            class_name_index: 9,
            values_index: 0,
            value_count: 0,
        };
        let result = archive.class_name(&object);
        assert!(matches!(
            result,
            Err(NibArchiveError::IndexOutOfRange("class names", 9, 2))
        ));
    }

    #[test]
    fn test_find_key() {
        let archive = sample_archive();

        assert_eq!(archive.find_key("NSFlags"), Some(1));
        assert_eq!(archive.find_key("NSMissing"), None);
    }
}
