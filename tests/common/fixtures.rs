//! Upstream payloads used across tests.
#![allow(dead_code)]

use super::constants::*;
use serde_json::{json, Value};

pub fn version(database_version: &str) -> Value {
    json!([{ "database_version": database_version, "last_update": "2026-10-01 00:00:00" }])
}

/// One spell with one printing priced at `price`.
pub fn single_spell_payload(price: &str) -> Value {
    json!({ "data": [{
        "id": TEST_SPELL_ID,
        "name": "Test",
        "type": "Spell Card",
        "frameType": "spell",
        "desc": "x",
        "card_sets": [{
            "set_name": "Set A",
            "set_code": TEST_SPELL_SET_CODE,
            "set_rarity": "Common",
            "set_price": price
        }]
    }]})
}

pub fn blue_eyes() -> Value {
    json!({
        "id": BLUE_EYES_ID,
        "name": "Blue-Eyes White Dragon",
        "type": "Normal Monster",
        "frameType": "normal",
        "desc": "This legendary dragon is a powerful engine of destruction.",
        "atk": 3000,
        "def": 2500,
        "level": 8,
        "race": "Dragon",
        "attribute": "LIGHT",
        "card_sets": [
            {
                "set_name": "Legend of Blue Eyes White Dragon",
                "set_code": "LOB-001",
                "set_rarity": "Ultra Rare",
                "set_rarity_code": "(UR)",
                "set_price": "89.31"
            },
            {
                "set_name": "Starter Deck: Kaiba",
                "set_code": "SDK-001",
                "set_rarity": "Ultra Rare",
                "set_rarity_code": "(UR)",
                "set_price": 12.5
            }
        ]
    })
}

pub fn dark_magician() -> Value {
    json!({
        "id": DARK_MAGICIAN_ID,
        "name": "Dark Magician",
        "type": "Normal Monster",
        "frameType": "normal",
        "desc": "The ultimate wizard in terms of attack and defense.",
        "atk": "2500",
        "def": "2100",
        "level": 7,
        "race": "Spellcaster",
        "attribute": "DARK",
        "card_sets": [{
            "set_name": "Legend of Blue Eyes White Dragon",
            "set_code": "LOB-005",
            "set_rarity": "Ultra Rare",
            "set_rarity_code": "(UR)",
            "set_price": "45.00"
        }]
    })
}

pub fn kuriboh() -> Value {
    json!({
        "id": KURIBOH_ID,
        "name": "Kuriboh",
        "type": "Effect Monster",
        "frameType": "effect",
        "desc": "During damage calculation, if your opponent's monster attacks, you can discard this card.",
        "atk": 300,
        "def": 200,
        "level": 1,
        "race": "Fiend",
        "attribute": "DARK",
        "card_sets": [
            {
                "set_name": "Unknown promo",
                "set_rarity": "Promo",
                "set_price": "3.00"
            },
            {
                "set_name": "Metal Raiders",
                "set_code": "MRD-071",
                "set_rarity": "Common",
                "set_rarity_code": "(C)",
                "set_price": "1.20"
            }
        ]
    })
}

pub fn pot_of_greed() -> Value {
    json!({
        "id": POT_OF_GREED_ID,
        "name": "Pot of Greed",
        "type": "Spell Card",
        "frameType": "spell",
        "desc": "Draw 2 cards.",
        "race": "Normal"
    })
}

pub fn mirror_force() -> Value {
    json!({
        "id": MIRROR_FORCE_ID,
        "name": "Mirror Force",
        "type": "Trap Card",
        "frameType": "trap",
        "desc": "When an opponent's monster declares an attack: Destroy all your opponent's Attack Position monsters.",
        "race": "Normal",
        "card_sets": [{
            "set_name": "Metal Raiders",
            "set_code": "MRD-138",
            "set_rarity": "Ultra Rare",
            "set_rarity_code": "(UR)",
            "set_price": "not priced"
        }]
    })
}

pub fn sample_catalog() -> Value {
    json!({ "data": [blue_eyes(), dark_magician(), kuriboh(), pot_of_greed(), mirror_force()] })
}

/// French names for the sample catalog, as served with `language=fr`.
pub fn sample_catalog_fr() -> Value {
    let mut cards = vec![blue_eyes(), dark_magician(), kuriboh(), pot_of_greed(), mirror_force()];
    let names = [
        "Dragon Blanc aux Yeux Bleus",
        "Magicien Sombre",
        "Kuriboh",
        "Pot de Cupidité",
        "Force de Miroir",
    ];
    for (card, name) in cards.iter_mut().zip(names) {
        card["name"] = json!(name);
    }
    json!({ "data": cards })
}
