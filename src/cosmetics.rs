//! Data-driven cosmetic definitions. Adding a cosmetic is a data addition –
//! nothing in the purchase/equip flow branches on specific ids.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CosmeticKind {
    Trail,
    FinishEffect,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CosmeticDef {
    pub id: String,
    pub name: String,
    pub kind: CosmeticKind,
    pub price: u64,
    /// Trail tint; `None` for effects that define their own colours.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb>,
    /// Shop description.
    pub description: String,
}

/// Static registry of purchasable cosmetics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CosmeticCatalog {
    cosmetics: Vec<CosmeticDef>,
}

impl CosmeticCatalog {
    pub fn new(cosmetics: Vec<CosmeticDef>) -> Self {
        Self { cosmetics }
    }

    pub fn all(&self) -> &[CosmeticDef] {
        &self.cosmetics
    }

    pub fn get(&self, id: &str) -> Option<&CosmeticDef> {
        self.cosmetics.iter().find(|c| c.id == id)
    }

    pub fn builtin() -> Self {
        Self::new(vec![
            CosmeticDef {
                id: "trail_neon_green".into(),
                name: "Neon Green Trail".into(),
                kind: CosmeticKind::Trail,
                price: 50,
                color: Some(Rgb { r: 57, g: 255, b: 20 }),
                description: "A bright neon green trail follows you as you run.".into(),
            },
            CosmeticDef {
                id: "trail_electric_blue".into(),
                name: "Electric Blue Trail".into(),
                kind: CosmeticKind::Trail,
                price: 75,
                color: Some(Rgb { r: 44, g: 117, b: 255 }),
                description: "An electric blue streak blazes behind you.".into(),
            },
            CosmeticDef {
                id: "finish_confetti".into(),
                name: "Confetti Burst".into(),
                kind: CosmeticKind::FinishEffect,
                price: 100,
                color: Some(Rgb { r: 255, g: 215, b: 0 }),
                description: "Confetti explodes when you cross the finish line!".into(),
            },
        ])
    }
}
