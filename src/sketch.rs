use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::board::model::{Color, Point};
use crate::board::BoardSession;

/// Recorded pointer strokes that can be replayed onto a board.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Sketch {
    /// CSS color used for every stroke; the board default when absent.
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub strokes: Vec<Vec<[f32; 2]>>,
}

impl Sketch {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read sketch {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("parse sketch {}", path.display()))
    }

    /// Replay every stroke as down, moves, up. Returns the number of strokes
    /// drawn; empty strokes are skipped.
    pub fn replay(&self, session: &mut BoardSession) -> anyhow::Result<usize> {
        if let Some(color) = self.color.as_deref() {
            let parsed = Color::parse_css(color)
                .with_context(|| format!("unsupported stroke color {color:?}"))?;
            session.set_color(parsed);
        }

        let mut drawn = 0;
        for stroke in &self.strokes {
            let mut points = stroke.iter().map(|&[x, y]| Point::new(x, y));
            let Some(first) = points.next() else {
                continue;
            };
            session.pointer_down(first);
            for point in points {
                session.pointer_move(point);
            }
            session.pointer_up();
            drawn += 1;
        }
        Ok(drawn)
    }
}
