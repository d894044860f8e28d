//! Preset obstacle arrangements.
//!
//! Coordinates are expressed relative to the field size where a preset
//! spans the field, and in absolute field units for bar lengths and grid
//! spacing.

use crate::config::EvolutionConfig;
use crate::constants::GOAL_OFFSET_Y;
use crate::geometry::{Anchor, Rect, Vec2};
use crate::obstacle::{Goal, ObstacleField};
use crate::rng::create_rng;
use rand::Rng;
use serde::{Deserialize, Serialize};

const BAR_LENGTH: f64 = 400.0;
const BAR_THICKNESS: f64 = 20.0;
const BLOCK_LENGTH: f64 = 100.0;
const BRICK_LENGTH: f64 = 50.0;
const BRICK_SPACING: usize = 60;
const SCATTER_COUNT: usize = 50;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Goal only.
    Open,
    /// One long bar across the middle.
    #[default]
    CenterBar,
    /// Two long bars at 30% and 70% height.
    TwoBars,
    /// Four short blocks around a long central bar.
    FourBlocks,
    /// Left, centre and right bars stepping upwards.
    Zigzag,
    /// Seven bars alternating between the left and right walls.
    Slalom,
    /// Three alternating bars topped by a row of bricks.
    Ladder,
    /// Staggered grid of bricks.
    Checkerboard,
    /// Bricks at seeded random positions in the middle band.
    Scatter,
}

impl Layout {
    pub const ALL: [Layout; 9] = [
        Layout::Open,
        Layout::CenterBar,
        Layout::TwoBars,
        Layout::FourBlocks,
        Layout::Zigzag,
        Layout::Slalom,
        Layout::Ladder,
        Layout::Checkerboard,
        Layout::Scatter,
    ];

    /// Goal placed centred horizontally near the top edge.
    pub fn goal(config: &EvolutionConfig) -> Goal {
        Goal::new(
            Vec2::new(config.field_width / 2.0, GOAL_OFFSET_Y),
            config.goal_radius,
        )
    }

    pub fn build(self, config: &EvolutionConfig) -> ObstacleField {
        ObstacleField::new(Self::goal(config), self.walls(config))
    }

    fn walls(self, config: &EvolutionConfig) -> Vec<Rect> {
        let (w, h) = (config.field_width, config.field_height);
        let bar = |x: f64, y: f64, anchor| Rect::anchored(x, y, BAR_LENGTH, BAR_THICKNESS, anchor);
        match self {
            Layout::Open => Vec::new(),
            Layout::CenterBar => vec![bar(w / 2.0, h / 2.0, Anchor::Center)],
            Layout::TwoBars => vec![
                bar(w / 2.0, h * 0.3, Anchor::Center),
                bar(w / 2.0, h * 0.7, Anchor::Center),
            ],
            Layout::FourBlocks => {
                let block = |x: f64, y: f64| {
                    Rect::anchored(x, y, BLOCK_LENGTH, BAR_THICKNESS, Anchor::Center)
                };
                vec![
                    block(w * 0.75, h * 0.25),
                    block(w * 0.75, h * 0.75),
                    block(w * 0.25, h * 0.25),
                    block(w * 0.25, h * 0.75),
                    bar(w / 2.0, h / 2.0, Anchor::Center),
                ]
            }
            Layout::Zigzag => vec![
                bar(0.0, h * 0.7, Anchor::Left),
                bar(w / 2.0, h / 2.0, Anchor::Center),
                bar(w, h * 0.3, Anchor::Right),
            ],
            Layout::Slalom => (2..=8)
                .rev()
                .map(|tenths| {
                    let y = h * f64::from(tenths) / 10.0;
                    if tenths % 2 == 0 {
                        bar(0.0, y, Anchor::Left)
                    } else {
                        bar(w, y, Anchor::Right)
                    }
                })
                .collect(),
            Layout::Ladder => {
                let mut walls = vec![
                    bar(0.0, h * 0.8, Anchor::Left),
                    bar(w, h * 0.6, Anchor::Right),
                    bar(0.0, h * 0.4, Anchor::Left),
                ];
                walls.extend(brick_columns(w, true).map(|x| {
                    Rect::anchored(x, h * 0.2, BRICK_LENGTH, BAR_THICKNESS, Anchor::Left)
                }));
                walls
            }
            Layout::Checkerboard => brick_columns(w, false)
                .flat_map(|x| {
                    (2..=8).map(move |tenths: u32| {
                        let offset = if tenths % 2 == 0 { BRICK_LENGTH / 2.0 } else { 0.0 };
                        Rect::anchored(
                            x + offset,
                            h * f64::from(tenths) / 10.0,
                            BRICK_LENGTH,
                            BAR_THICKNESS,
                            Anchor::Left,
                        )
                    })
                })
                .collect(),
            Layout::Scatter => {
                let mut rng = create_rng(config.seed);
                let max_x = (w - BRICK_LENGTH).max(1.0) as u64;
                let min_y = (h * 0.2) as u64;
                let max_y = ((h * 0.8) as u64).max(min_y + 1);
                (0..SCATTER_COUNT)
                    .map(|_| {
                        let x = rng.random_range(0..max_x) as f64;
                        let y = rng.random_range(min_y..max_y) as f64;
                        Rect::anchored(x, y, BRICK_LENGTH, BAR_THICKNESS, Anchor::Left)
                    })
                    .collect()
            }
        }
    }
}

/// Left edges of a brick row spaced `BRICK_SPACING` apart.
fn brick_columns(width: f64, include_edge: bool) -> impl Iterator<Item = f64> {
    let end = width as usize + usize::from(include_edge);
    (0..end).step_by(BRICK_SPACING).map(|x| x as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obstacle::CollisionQuery;

    #[test]
    fn every_layout_keeps_start_and_goal_clear() {
        let config = EvolutionConfig::default();
        for layout in Layout::ALL {
            let field = layout.build(&config);
            assert!(
                !field.collides(config.start_position),
                "{layout:?} blocks the start position"
            );
            assert!(
                !field.collides(field.goal().center),
                "{layout:?} blocks the goal"
            );
        }
    }

    #[test]
    fn preset_wall_counts() {
        let config = EvolutionConfig::default();
        let count = |layout: Layout| layout.build(&config).walls().count();
        assert_eq!(count(Layout::Open), 0);
        assert_eq!(count(Layout::CenterBar), 1);
        assert_eq!(count(Layout::FourBlocks), 5);
        assert_eq!(count(Layout::Slalom), 7);
        assert_eq!(count(Layout::Ladder), 14);
        assert_eq!(count(Layout::Checkerboard), 70);
        assert_eq!(count(Layout::Scatter), SCATTER_COUNT);
    }

    #[test]
    fn scatter_is_seeded() {
        let config = EvolutionConfig::default();
        let a = Layout::Scatter.build(&config);
        let b = Layout::Scatter.build(&config);
        assert_eq!(a.obstacles(), b.obstacles());
    }

    #[test]
    fn center_bar_spans_middle() {
        let config = EvolutionConfig::default();
        let field = Layout::CenterBar.build(&config);
        assert!(field.collides(Vec2::new(300.0, 300.0)));
        assert!(!field.collides(Vec2::new(50.0, 300.0)));
    }
}
