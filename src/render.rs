use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::engine::MapState;
use crate::entities::MobileEntity;
use crate::types::Color;

pub const PLACEHOLDER_SYMBOL: char = '?';
const TOWN_SYMBOL: char = 'T';
const PLAYER_SYMBOL: char = '@';
const ASTEROID_SYMBOL: char = '*';
const EMPTY_SYMBOL: char = '.';

const BUILTIN_SPRITES: &[(&str, char)] = &[
    ("goblin", 'g'),
    ("slime", 's'),
    ("vulture", 'v'),
    ("troll", 't'),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Glyph {
    pub symbol: char,
    pub color: Option<Color>,
}

#[derive(Deserialize)]
struct SpriteFile {
    sprites: HashMap<String, String>,
}

#[derive(Clone, Debug)]
pub struct SpriteRegistry {
    sprites: HashMap<String, char>,
}

impl Default for SpriteRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SpriteRegistry {
    pub fn builtin() -> Self {
        Self {
            sprites: BUILTIN_SPRITES
                .iter()
                .map(|(name, symbol)| (name.to_string(), *symbol))
                .collect(),
        }
    }

    pub fn load(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(value) => value,
            Err(error) => {
                if error.kind() != std::io::ErrorKind::NotFound {
                    eprintln!("[sprites] failed to read {}: {error}", path.display());
                }
                return Self::builtin();
            }
        };
        let parsed: SpriteFile = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(error) => {
                eprintln!("[sprites] failed to parse {}: {error}", path.display());
                return Self::builtin();
            }
        };

        let mut registry = Self::builtin();
        for (name, value) in parsed.sprites {
            let mut chars = value.chars();
            match (chars.next(), chars.next()) {
                (Some(symbol), None) => {
                    registry.sprites.insert(name, symbol);
                }
                _ => eprintln!(
                    "[sprites] ignoring sprite '{name}' in {}: expected one character",
                    path.display()
                ),
            }
        }
        registry
    }

    pub fn glyph(&self, sprite_name: &str, color: Color) -> Glyph {
        match self.sprites.get(sprite_name) {
            Some(symbol) => Glyph {
                symbol: *symbol,
                color: Some(color),
            },
            None => Glyph {
                symbol: PLACEHOLDER_SYMBOL,
                color: Some(color),
            },
        }
    }
}

pub fn render_map(state: &MapState, grid_size: i32, sprites: &SpriteRegistry, ansi: bool) -> Vec<String> {
    let size = grid_size.max(0) as usize;
    let plain = |symbol| Glyph {
        symbol,
        color: None,
    };
    let mut cells = vec![vec![plain(EMPTY_SYMBOL); size]; size];
    let mut put = |x: i32, y: i32, glyph: Glyph| {
        if x >= 0 && y >= 0 && (x as usize) < size && (y as usize) < size {
            cells[y as usize][x as usize] = glyph;
        }
    };

    let town = state.town();
    put(town.x, town.y, plain(TOWN_SYMBOL));
    for asteroid in &state.asteroids {
        let pos = asteroid.position();
        put(pos.x, pos.y, plain(ASTEROID_SYMBOL));
    }
    for monster in &state.monsters {
        let pos = monster.position();
        put(pos.x, pos.y, sprites.glyph(&monster.sprite_name, monster.color));
    }
    let player = state.player_pos();
    put(player.x, player.y, plain(PLAYER_SYMBOL));

    cells
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|glyph| paint(glyph, ansi))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

fn paint(glyph: Glyph, ansi: bool) -> String {
    match glyph.color {
        Some((r, g, b)) if ansi => format!("\x1b[38;2;{r};{g};{b}m{}\x1b[0m", glyph.symbol),
        _ => glyph.symbol.to_string(),
    }
}
