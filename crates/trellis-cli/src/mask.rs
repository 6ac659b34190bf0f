//! `mask` command: replay edit ops against a grayscale image.

use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use image::GrayImage;
use trellis_config::{log_cli_info, MaskConfig};
use trellis_mask::{MaskHistory, Point, Raster};

/// One edit step. Omitted radius/color fall back to `[mask]` config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaskOp {
    Stroke {
        from: Point,
        to: Point,
        radius: Option<u32>,
        color: Option<u8>,
    },
    Erase {
        from: Point,
        to: Point,
        radius: Option<u32>,
    },
    Fill {
        seed: Point,
        color: Option<u8>,
    },
    Commit,
    Undo,
    Redo,
    Clear,
    Delete,
}

impl FromStr for MaskOp {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, args) = match s.split_once(':') {
            Some((name, args)) => (name, parse_numbers(args)?),
            None => (s, Vec::new()),
        };

        let op = match (name, args.as_slice()) {
            ("stroke", [x0, y0, x1, y1, rest @ ..]) if rest.len() <= 2 => MaskOp::Stroke {
                from: point(*x0, *y0)?,
                to: point(*x1, *y1)?,
                radius: rest.first().map(|&r| radius(r)).transpose()?,
                color: rest.get(1).map(|&c| color(c)).transpose()?,
            },
            ("erase", [x0, y0, x1, y1, rest @ ..]) if rest.len() <= 1 => MaskOp::Erase {
                from: point(*x0, *y0)?,
                to: point(*x1, *y1)?,
                radius: rest.first().map(|&r| radius(r)).transpose()?,
            },
            ("fill", [x, y, rest @ ..]) if rest.len() <= 1 => MaskOp::Fill {
                seed: point(*x, *y)?,
                color: rest.first().map(|&c| color(c)).transpose()?,
            },
            ("commit", []) => MaskOp::Commit,
            ("undo", []) => MaskOp::Undo,
            ("redo", []) => MaskOp::Redo,
            ("clear", []) => MaskOp::Clear,
            ("delete", []) => MaskOp::Delete,
            _ => bail!("Invalid mask op {:?}", s),
        };
        Ok(op)
    }
}

fn parse_numbers(args: &str) -> Result<Vec<i64>> {
    args.split(',')
        .map(|n| {
            n.trim()
                .parse::<i64>()
                .with_context(|| format!("Invalid number {:?}", n))
        })
        .collect()
}

fn point(x: i64, y: i64) -> Result<Point> {
    Ok(Point::new(
        i32::try_from(x).map_err(|_| anyhow!("Coordinate out of range: {}", x))?,
        i32::try_from(y).map_err(|_| anyhow!("Coordinate out of range: {}", y))?,
    ))
}

fn radius(r: i64) -> Result<u32> {
    u32::try_from(r).map_err(|_| anyhow!("Invalid radius: {}", r))
}

fn color(c: i64) -> Result<u8> {
    u8::try_from(c).map_err(|_| anyhow!("Color must be 0-255, got {}", c))
}

/// Apply `ops` to `history` in order.
pub fn apply(history: &MaskHistory, ops: &[MaskOp], config: &MaskConfig) -> Result<()> {
    for op in ops {
        match *op {
            MaskOp::Stroke {
                from,
                to,
                radius,
                color,
            } => history.paint_stroke(
                from,
                to,
                radius.unwrap_or(config.brush_radius),
                color.unwrap_or(config.paint_value),
                false,
            )?,
            MaskOp::Erase { from, to, radius } => history.paint_stroke(
                from,
                to,
                radius.unwrap_or(config.brush_radius),
                config.erase_value,
                false,
            )?,
            MaskOp::Fill { seed, color } => {
                history.fill(seed, color.unwrap_or(config.paint_value))?
            }
            MaskOp::Commit => history.commit()?,
            MaskOp::Undo => {
                if !history.undo() {
                    eprintln!("Nothing to undo");
                }
            }
            MaskOp::Redo => {
                if !history.redo() {
                    eprintln!("Nothing to redo");
                }
            }
            MaskOp::Clear => history.clear_history()?,
            MaskOp::Delete => history.delete_mask()?,
        }
    }
    Ok(())
}

pub fn cmd_mask(input: &Path, output: &Path, ops: &[MaskOp], config: &MaskConfig) -> Result<()> {
    let image = image::open(input)
        .with_context(|| format!("Failed to open {}", input.display()))?
        .into_luma8();
    let (width, height) = image.dimensions();
    let mask = Raster::from_vec(width as usize, height as usize, image.into_raw())?;

    let history = MaskHistory::new().with_paint_value(config.paint_value);
    history.load(mask);
    apply(&history, ops, config)?;

    let current = history
        .current_mask()
        .ok_or_else(|| anyhow!("No mask loaded"))?;
    let out = GrayImage::from_raw(width, height, current.into_vec())
        .ok_or_else(|| anyhow!("Mask buffer does not match {}x{}", width, height))?;
    out.save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    log_cli_info!(
        "Mask written",
        ops = ops.len(),
        history = history.len(),
        ptr = history.ptr()
    );
    println!(
        "Wrote {} ({} history entries, at {})",
        output.display(),
        history.len(),
        history.ptr()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ops() {
        assert_eq!(
            "stroke:0,0,4,4".parse::<MaskOp>().unwrap(),
            MaskOp::Stroke {
                from: Point::new(0, 0),
                to: Point::new(4, 4),
                radius: None,
                color: None
            }
        );
        assert_eq!(
            "stroke:1,2,3,4,5,128".parse::<MaskOp>().unwrap(),
            MaskOp::Stroke {
                from: Point::new(1, 2),
                to: Point::new(3, 4),
                radius: Some(5),
                color: Some(128)
            }
        );
        assert_eq!(
            "fill: 3, 3".parse::<MaskOp>().unwrap(),
            MaskOp::Fill {
                seed: Point::new(3, 3),
                color: None
            }
        );
        assert_eq!("undo".parse::<MaskOp>().unwrap(), MaskOp::Undo);
    }

    #[test]
    fn test_parse_rejects_bad_ops() {
        for bad in [
            "stroke:1,2,3",
            "stroke:1,2,3,4,5,6,7",
            "fill:1,x",
            "fill:1,1,300",
            "stroke:0,0,1,1,-2",
            "undo:1",
            "paint",
        ] {
            assert!(bad.parse::<MaskOp>().is_err(), "{} should not parse", bad);
        }
    }

    #[test]
    fn test_apply_uses_config_defaults() {
        let config = MaskConfig {
            brush_radius: 0,
            paint_value: 255,
            erase_value: 0,
        };
        let history = MaskHistory::new();
        history.load(Raster::new(4, 4));

        let ops: Vec<MaskOp> = ["stroke:0,0,3,0", "commit", "erase:0,0,1,0", "commit", "undo"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        apply(&history, &ops, &config).unwrap();

        let mask = history.current_mask().unwrap();
        assert_eq!(&mask.as_bytes()[..4], &[255, 255, 255, 255]);
        assert_eq!(history.ptr(), 1);
        assert!(history.can_redo());
    }
}
