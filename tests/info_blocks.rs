//! Decoding of items and their tagged info-block trees.

mod common;

use pretty_assertions::assert_eq;
use serde_json::json;

use stalcraft_catalog::models::{self, decode_blocks, decode_tagged};
use stalcraft_catalog::{DamageProfile, InfoBlock, Item, Rank, TranslationLines, TranslationString};

// ---------------------------------------------------------------------------
// Whole items
// ---------------------------------------------------------------------------

#[test]
fn fixture_item_decodes() {
    let item = common::ak74();

    assert_eq!(item.id, "y3nmw");
    assert_eq!(item.category, "weapon/assault_rifle");
    assert_eq!(item.display_name("en"), "AK-74M");
    assert_eq!(item.display_name("ru"), "АК-74М");
    assert_eq!(item.rank(), Rank::Stalker);
    assert_eq!(item.status.state, "PERSONAL_ON_USE");
    assert_eq!(item.icon_path, None);

    let kinds: Vec<&str> = item.info_blocks.iter().map(InfoBlock::kind).collect();
    assert_eq!(kinds, ["list", "damage", "list", "text", "usage", "item"]);
}

#[test]
fn nested_lists_keep_their_structure() {
    let item = common::ak74();

    let InfoBlock::List { title, elements } = &item.info_blocks[2] else {
        panic!("expected a list, got {:?}", item.info_blocks[2]);
    };
    assert_eq!(title.as_ref().map(|t| t.resolve("en")), Some("Modifiers"));
    assert_eq!(elements.len(), 2);

    let InfoBlock::List { title, elements } = &elements[1] else {
        panic!("expected a nested list");
    };
    assert_eq!(title.as_ref().map(|t| t.resolve("en")), Some("Handling"));
    // The null entry and the entry without a type are dropped.
    assert_eq!(
        elements,
        &vec![InfoBlock::Range {
            name: TranslationString::text("Spread"),
            min: 0.5,
            max: 1.25,
        }]
    );

    assert_eq!(item.info_blocks[0].depth(), 1);
    assert_eq!(item.info_blocks[2].depth(), 2);
    assert_eq!(item.info_blocks[1].depth(), 0);
}

#[test]
fn item_without_blocks_or_optional_fields() {
    let item: Item = serde_json::from_value(json!({
        "id": "abc",
        "name": { "type": "text", "text": "Bandage" },
        "infoBlocks": null
    }))
    .unwrap();

    assert_eq!(item.category, "");
    assert_eq!(item.rank(), Rank::Other);
    assert!(item.info_blocks.is_empty());
}

#[test]
fn unknown_block_type_inside_an_item_fails() {
    let err = serde_json::from_value::<Item>(json!({
        "id": "bad",
        "name": { "type": "text", "text": "Bad" },
        "infoBlocks": [
            { "type": "list", "elements": [ { "type": "hologram", "name": "x" } ] }
        ]
    }))
    .unwrap_err();

    assert!(err.to_string().contains("unknown variant"), "{err}");
}

#[test]
fn deep_nesting_decodes() {
    let mut value = json!({ "type": "usage", "name": { "type": "text", "text": "leaf" } });
    for _ in 0..40 {
        value = json!({ "type": "list", "elements": [value] });
    }

    let block: InfoBlock = decode_tagged(value).unwrap().unwrap();
    assert_eq!(block.depth(), 40);
}

fn nested_item_json(levels: usize) -> String {
    let mut block = r#"{"type":"usage","name":{"type":"text","text":"leaf"}}"#.to_string();
    for _ in 0..levels {
        block = format!(r#"{{"type":"list","elements":[null,{block}]}}"#);
    }
    format!(r#"{{"id":"deep","name":{{"type":"text","text":"Deep"}},"infoBlocks":[{block}]}}"#)
}

#[test]
fn deep_nesting_parses_from_text() {
    let item: Item = models::from_str(&nested_item_json(400)).unwrap();
    assert_eq!(item.info_blocks[0].depth(), 400);
}

#[test]
fn unbounded_parse_still_rejects_bad_documents() {
    let mut text = nested_item_json(3);
    text.push_str(" trailing");
    assert!(models::from_str::<Item>(&text).is_err());

    let unknown = nested_item_json(200).replace(r#""type":"usage""#, r#""type":"chart""#);
    let err = models::from_str::<Item>(&unknown).unwrap_err();
    assert!(err.to_string().contains("unknown variant"), "{err}");
}

// ---------------------------------------------------------------------------
// Single blocks
// ---------------------------------------------------------------------------

#[test]
fn each_variant_decodes() {
    let blocks = decode_blocks(vec![
        json!({ "type": "text", "text": { "type": "text", "text": "plain" } }),
        json!({
            "type": "numeric",
            "name": { "type": "text", "text": "Weight" },
            "value": 2
        }),
        json!({
            "type": "damage",
            "startDamage": 10,
            "damageDecreaseStart": 5,
            "endDamage": 4,
            "damageDecreaseEnd": 15,
            "maxDistance": 20
        }),
        json!({
            "type": "range",
            "name": { "type": "text", "text": "Spread" },
            "min": 1,
            "max": 2
        }),
        json!({
            "type": "key-value",
            "key": { "type": "text", "text": "Class" },
            "value": { "type": "text", "text": "Rifle" }
        }),
        json!({ "type": "list", "elements": [] }),
        json!({ "type": "usage", "name": { "type": "text", "text": "Craft" } }),
        json!({ "type": "item", "name": { "type": "text", "text": "Ammo" } }),
    ])
    .unwrap();

    assert_eq!(
        blocks,
        vec![
            InfoBlock::Text {
                title: None,
                text: TranslationString::text("plain"),
            },
            InfoBlock::Numeric {
                name: TranslationString::text("Weight"),
                value: 2.0,
                formatted: None,
            },
            InfoBlock::Damage(DamageProfile {
                start_damage: 10.0,
                damage_decrease_start: 5.0,
                end_damage: 4.0,
                damage_decrease_end: 15.0,
                max_distance: 20.0,
            }),
            InfoBlock::Range {
                name: TranslationString::text("Spread"),
                min: 1.0,
                max: 2.0,
            },
            InfoBlock::KeyValue {
                key: TranslationString::text("Class"),
                value: TranslationString::text("Rifle"),
            },
            InfoBlock::List {
                title: None,
                elements: vec![],
            },
            InfoBlock::Usage {
                name: TranslationString::text("Craft"),
            },
            InfoBlock::Item {
                name: TranslationString::text("Ammo"),
            },
        ]
    );
}

#[test]
fn missing_or_null_type_is_absent() {
    assert_eq!(InfoBlock::from_value(json!(null)).unwrap(), None);
    assert_eq!(InfoBlock::from_value(json!({ "name": "x" })).unwrap(), None);
    assert_eq!(InfoBlock::from_value(json!({ "type": null })).unwrap(), None);
}

#[test]
fn unknown_type_is_an_error() {
    let err = InfoBlock::from_value(json!({ "type": "chart" })).unwrap_err();
    assert!(err.to_string().contains("unknown variant"), "{err}");

    let err = decode_tagged::<TranslationString>(json!({ "type": "markdown", "text": "x" }))
        .unwrap_err();
    assert!(err.to_string().contains("unknown variant"), "{err}");
}

#[test]
fn known_type_with_missing_field_is_an_error() {
    assert!(InfoBlock::from_value(json!({ "type": "range", "min": 1 })).is_err());
}

#[test]
fn null_list_title_is_absent() {
    let block = InfoBlock::from_value(json!({
        "type": "list",
        "title": null,
        "elements": [null]
    }))
    .unwrap()
    .unwrap();

    assert_eq!(
        block,
        InfoBlock::List {
            title: None,
            elements: vec![],
        }
    );
}

#[test]
fn serialized_blocks_decode_back() {
    let item = common::ak74();
    let value = serde_json::to_value(&item.info_blocks).unwrap();
    let values = match value {
        serde_json::Value::Array(values) => values,
        other => panic!("expected an array, got {other}"),
    };

    assert_eq!(decode_blocks(values).unwrap(), item.info_blocks);
}

// ---------------------------------------------------------------------------
// Translations
// ---------------------------------------------------------------------------

#[test]
fn translation_fallback_order() {
    let both: TranslationLines = [("ru", "Вес"), ("en", "Weight")].into_iter().collect();
    assert_eq!(both.resolve("en"), "Weight");
    assert_eq!(both.resolve("ru"), "Вес");
    assert_eq!(both.resolve("de"), "Weight");

    let ru_only: TranslationLines = [("ru", "Вес")].into_iter().collect();
    assert_eq!(ru_only.resolve("en"), "Вес");

    let other: TranslationLines = [("es", "Peso")].into_iter().collect();
    assert_eq!(other.resolve("en"), "Peso");

    assert_eq!(TranslationLines::default().resolve("en"), "");
}

#[test]
fn literal_text_ignores_language() {
    let text = TranslationString::text("5.45x39");
    assert_eq!(text.resolve("en"), "5.45x39");
    assert_eq!(text.resolve("ru"), "5.45x39");
}

// ---------------------------------------------------------------------------
// Damage fall-off
// ---------------------------------------------------------------------------

#[test]
fn damage_falls_off_linearly() {
    let damage = DamageProfile {
        start_damage: 40.0,
        damage_decrease_start: 20.0,
        end_damage: 20.0,
        damage_decrease_end: 40.0,
        max_distance: 100.0,
    };

    assert_eq!(damage.damage_at(0.0), Some(40.0));
    assert_eq!(damage.damage_at(20.0), Some(40.0));
    assert_eq!(damage.damage_at(30.0), Some(30.0));
    assert_eq!(damage.damage_at(40.0), Some(20.0));
    assert_eq!(damage.damage_at(100.0), Some(20.0));
    assert_eq!(damage.damage_at(100.5), None);
    assert_eq!(damage.damage_at(-1.0), None);
}
