//! Certificate templates and their color palettes.

use image::Rgb;
use serde::{Deserialize, Serialize};

use crate::grade::Grade;
use crate::models::CustomDesign;

/// Slot defaults for custom palettes with missing or malformed entries.
const CUSTOM_DEFAULTS: [[u8; 3]; 5] = [
    [0x66, 0x7e, 0xea],
    [0x76, 0x4b, 0xa2],
    [0xf0, 0x93, 0xfb],
    [0xf5, 0x57, 0x6c],
    [0x4f, 0xac, 0xfe],
];
const CUSTOM_TOP_LIGHTEN: u8 = 100;
const CUSTOM_BOTTOM_LIGHTEN: u8 = 120;

/// Named certificate template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    Classic,
    Modern,
    Elegant,
    Vibrant,
    Custom,
}

impl Template {
    /// Parse a builtin template identifier. Anything else falls back to vibrant,
    /// including `custom` when no design accompanies it.
    pub fn parse_builtin(s: &str) -> Self {
        match s {
            "classic" => Template::Classic,
            "modern" => Template::Modern,
            "elegant" => Template::Elegant,
            _ => Template::Vibrant,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Template::Classic => "classic",
            Template::Modern => "modern",
            Template::Elegant => "elegant",
            Template::Vibrant => "vibrant",
            Template::Custom => "custom",
        }
    }
}

/// The colors a certificate is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub gold: Rgb<u8>,
    pub dark_gold: Rgb<u8>,
    pub royal_blue: Rgb<u8>,
    pub navy: Rgb<u8>,
    pub accent: Rgb<u8>,
    pub gray: Rgb<u8>,
    pub light_gray: Rgb<u8>,
    pub gradient_top: Rgb<u8>,
    pub gradient_bottom: Rgb<u8>,
}

impl Palette {
    /// Palette for a builtin template. `Custom` without a design renders as vibrant.
    pub fn builtin(template: Template) -> Self {
        match template {
            Template::Classic => Palette {
                gold: rgb(0xFFD700),
                dark_gold: rgb(0xB8860B),
                royal_blue: rgb(0x1e3a8a),
                navy: rgb(0x0f1419),
                accent: rgb(0x3b82f6),
                gray: rgb(0x374151),
                light_gray: rgb(0xf8f9fa),
                gradient_top: Rgb([255, 255, 255]),
                gradient_bottom: Rgb([240, 245, 255]),
            },
            Template::Modern => Palette {
                gold: rgb(0xF59E0B),
                dark_gold: rgb(0xD97706),
                royal_blue: rgb(0x3B82F6),
                navy: rgb(0x1E40AF),
                accent: rgb(0x60A5FA),
                gray: rgb(0x4B5563),
                light_gray: rgb(0xF3F4F6),
                gradient_top: Rgb([249, 250, 251]),
                gradient_bottom: Rgb([243, 244, 246]),
            },
            Template::Elegant => Palette {
                gold: rgb(0xB45309),
                dark_gold: rgb(0x92400E),
                royal_blue: rgb(0x7C2D12),
                navy: rgb(0x451A03),
                accent: rgb(0xA16207),
                gray: rgb(0x57534E),
                light_gray: rgb(0xFEF7ED),
                gradient_top: Rgb([254, 252, 232]),
                gradient_bottom: Rgb([251, 246, 232]),
            },
            Template::Vibrant | Template::Custom => Palette {
                gold: rgb(0xEAB308),
                dark_gold: rgb(0xCA8A04),
                royal_blue: rgb(0x7C3AED),
                navy: rgb(0x5B21B6),
                accent: rgb(0x8B5CF6),
                gray: rgb(0x6B7280),
                light_gray: rgb(0xF5F3FF),
                gradient_top: Rgb([245, 243, 255]),
                gradient_bottom: Rgb([237, 233, 254]),
            },
        }
    }

    /// Palette for a custom design. Entries map positionally onto gold, dark gold,
    /// royal blue, navy and accent; the gradient is the first two entries lightened.
    pub fn custom(colors: &[String]) -> Self {
        let slot = |i: usize| {
            colors
                .get(i)
                .and_then(|c| parse_hex_color(c))
                .unwrap_or(Rgb(CUSTOM_DEFAULTS[i]))
        };

        let gold = slot(0);
        let dark_gold = slot(1);

        Palette {
            gold,
            dark_gold,
            royal_blue: slot(2),
            navy: slot(3),
            accent: slot(4),
            gray: rgb(0x374151),
            light_gray: rgb(0xf8f9fa),
            gradient_top: lighten(gold, CUSTOM_TOP_LIGHTEN),
            gradient_bottom: lighten(dark_gold, CUSTOM_BOTTOM_LIGHTEN),
        }
    }

    /// Resolve the template and palette for a render request. A design always wins.
    pub fn resolve(template: Template, design: Option<&CustomDesign>) -> (Template, Self) {
        match design {
            Some(design) => (Template::Custom, Palette::custom(&design.color_palette)),
            None => {
                let template = match template {
                    Template::Custom => Template::Vibrant,
                    other => other,
                };
                (template, Palette::builtin(template))
            }
        }
    }

    /// Highlight color of a grade band.
    pub fn grade_color(&self, grade: Grade) -> Rgb<u8> {
        match grade {
            Grade::Outstanding => self.gold,
            Grade::Excellent => self.accent,
            Grade::Good => self.royal_blue,
            Grade::Satisfactory => self.gray,
        }
    }
}

const fn rgb(hex: u32) -> Rgb<u8> {
    Rgb([(hex >> 16) as u8, (hex >> 8) as u8, hex as u8])
}

/// Parse `#RRGGBB` (the `#` is optional).
pub fn parse_hex_color(s: &str) -> Option<Rgb<u8>> {
    let s = s.trim().trim_start_matches('#');
    if s.len() != 6 || !s.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
    Some(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}

/// Add `amount` to every channel, saturating at 255.
fn lighten(color: Rgb<u8>, amount: u8) -> Rgb<u8> {
    let Rgb([r, g, b]) = color;
    Rgb([
        r.saturating_add(amount),
        g.saturating_add(amount),
        b.saturating_add(amount),
    ])
}
