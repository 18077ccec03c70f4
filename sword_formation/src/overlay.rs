//! Status overlay: what the HUD says and in which colour.
//!
//! | State | Status line | Colour | Hint |
//! |---|---|---|---|
//! | not tracking | `WAITING FOR HAND...` | `#ff6666` | raise a hand to summon |
//! | `DRAGON` | `WANDERING DRAGON` | `#00ff88` | point one finger |
//! | `LOTUS` | `LOTUS BLOOM` | `#ffaa44` | open the palm |
//! | `SHIELD` | `SWORD SHIELD` | `#88ccff` | make a fist |
//! | `DAGENG` | `GREAT GENG ARRAY` | `#ffd700` | horns seal |
//!
//! The title takes the mode colour too, except that it stays green while
//! no hand is tracked.

use formation_core::GestureMode;

pub const TITLE: &str = "THANH TRUC PHONG VAN KIEM";

const WAITING: u32 = 0xFFFF6666;
const JADE:    u32 = 0xFF00FF88;
const AMBER:   u32 = 0xFFFFAA44;
const ICE:     u32 = 0xFF88CCFF;
const GOLD:    u32 = 0xFFFFD700;

/// Everything the HUD shows for one tracking state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Overlay {
    pub status:       &'static str,
    pub status_color: u32,
    pub title_color:  u32,
    pub hint:         &'static str,
}

impl Overlay {
    pub fn for_state(is_tracking: bool, mode: GestureMode) -> Self {
        if !is_tracking {
            return Overlay {
                status:       "WAITING FOR HAND...",
                status_color: WAITING,
                title_color:  JADE,
                hint:         "RAISE A HAND TO SUMMON THE SWORDS",
            };
        }
        let color = mode_color(mode);
        let (status, hint) = match mode {
            GestureMode::Dragon => ("WANDERING DRAGON", "SWORD FINGER - THE DRAGON FOLLOWS"),
            GestureMode::Lotus  => ("LOTUS BLOOM",      "OPEN PALM - THE LOTUS APPEARS"),
            GestureMode::Shield => ("SWORD SHIELD",     "FIST - BLADES GUARD THE BODY"),
            GestureMode::Dageng => ("GREAT GENG ARRAY", "HORNS SEAL - THE GREAT ARRAY"),
        };
        Overlay { status, status_color: color, title_color: color, hint }
    }
}

/// Blade and HUD colour for a mode.
pub fn mode_color(mode: GestureMode) -> u32 {
    match mode {
        GestureMode::Dragon => JADE,
        GestureMode::Lotus  => AMBER,
        GestureMode::Shield => ICE,
        GestureMode::Dageng => GOLD,
    }
}

/// Border colour for the detector indicator: green once frames arrive.
pub fn source_color(ready: bool) -> u32 {
    if ready { JADE } else { WAITING }
}
