//! Configuration for meridian.
//!
//! The config is a KDL document with three kinds of top-level nodes: `gestures`, `scaling` and any
//! number of `output "<connector>"` sections. Everything is optional; an empty file yields
//! [`Config::default()`].

use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use knuffel::errors::DecodeError;
use miette::{Context, IntoDiagnostic};
use tracing::debug;

pub mod gestures;
pub mod output;
pub mod scaling;

pub use crate::gestures::{Gestures, ThresholdDistance, TriggerEdge, DEFAULT_DRAG_THRESHOLD};
pub use crate::output::Output;
pub use crate::scaling::Scaling;

#[derive(knuffel::Decode, Debug, Default, Clone, PartialEq)]
pub struct Config {
    #[knuffel(child, default)]
    pub gestures: Gestures,
    #[knuffel(child, default)]
    pub scaling: Scaling,
    #[knuffel(children(name = "output"))]
    pub outputs: Vec<Output>,
}

impl Config {
    pub fn load(path: &Path) -> miette::Result<Self> {
        let contents = fs::read_to_string(path)
            .into_diagnostic()
            .with_context(|| format!("error reading {path:?}"))?;

        let config = Self::parse(
            path.file_name()
                .and_then(OsStr::to_str)
                .unwrap_or("config.kdl"),
            &contents,
        )
        .context("error parsing")?;
        debug!("loaded config from {path:?}");
        Ok(config)
    }

    pub fn parse(filename: &str, text: &str) -> Result<Self, knuffel::Error> {
        let _span = tracy_client::span!("Config::parse");
        knuffel::parse(filename, text)
    }

    /// Finds the output section for a connector name, compared case-insensitively.
    pub fn output(&self, connector: &str) -> Option<&Output> {
        self.outputs
            .iter()
            .find(|output| output.name.eq_ignore_ascii_case(connector))
    }
}

/// A number that may be written either as an integer or as a decimal.
///
/// KDL keeps the two apart, and knuffel refuses to decode `8` into an `f64`.
#[derive(Debug, Default, Clone, Copy, PartialEq, PartialOrd)]
pub struct FloatOrInt<const MIN: i32, const MAX: i32>(pub f64);

/// An integer that must fall within `MIN..=MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bounded<const MIN: u32, const MAX: u32>(pub u32);

impl<const MIN: u32, const MAX: u32> Default for Bounded<MIN, MAX> {
    fn default() -> Self {
        Self(MIN)
    }
}

fn reject_type_name<S: knuffel::traits::ErrorSpan>(
    type_name: &Option<knuffel::span::Spanned<knuffel::ast::TypeName, S>>,
    ctx: &mut knuffel::decode::Context<S>,
) {
    if let Some(type_name) = &type_name {
        ctx.emit_error(DecodeError::unexpected(
            type_name,
            "type name",
            "no type name expected for this node",
        ));
    }
}

impl<S: knuffel::traits::ErrorSpan, const MIN: i32, const MAX: i32> knuffel::DecodeScalar<S>
    for FloatOrInt<MIN, MAX>
{
    fn type_check(
        type_name: &Option<knuffel::span::Spanned<knuffel::ast::TypeName, S>>,
        ctx: &mut knuffel::decode::Context<S>,
    ) {
        reject_type_name(type_name, ctx);
    }

    fn raw_decode(
        val: &knuffel::span::Spanned<knuffel::ast::Literal, S>,
        ctx: &mut knuffel::decode::Context<S>,
    ) -> Result<Self, DecodeError<S>> {
        let value = match &**val {
            knuffel::ast::Literal::Int(ref value) => match i32::try_from(value) {
                Ok(v) => f64::from(v),
                Err(e) => {
                    ctx.emit_error(DecodeError::conversion(val, e));
                    return Ok(Self::default());
                }
            },
            knuffel::ast::Literal::Decimal(ref value) => match f64::try_from(value) {
                Ok(v) => v,
                Err(e) => {
                    ctx.emit_error(DecodeError::conversion(val, e));
                    return Ok(Self::default());
                }
            },
            _ => {
                ctx.emit_error(DecodeError::scalar_kind(knuffel::decode::Kind::Int, val));
                return Ok(Self::default());
            }
        };

        if !(f64::from(MIN)..=f64::from(MAX)).contains(&value) {
            ctx.emit_error(DecodeError::conversion(
                val,
                format!("value must be between {MIN} and {MAX}"),
            ));
            return Ok(Self::default());
        }

        Ok(Self(value))
    }
}

impl<S: knuffel::traits::ErrorSpan, const MIN: u32, const MAX: u32> knuffel::DecodeScalar<S>
    for Bounded<MIN, MAX>
{
    fn type_check(
        type_name: &Option<knuffel::span::Spanned<knuffel::ast::TypeName, S>>,
        ctx: &mut knuffel::decode::Context<S>,
    ) {
        reject_type_name(type_name, ctx);
    }

    fn raw_decode(
        val: &knuffel::span::Spanned<knuffel::ast::Literal, S>,
        ctx: &mut knuffel::decode::Context<S>,
    ) -> Result<Self, DecodeError<S>> {
        match &**val {
            knuffel::ast::Literal::Int(ref value) => match u32::try_from(value) {
                Ok(v) if (MIN..=MAX).contains(&v) => Ok(Self(v)),
                Ok(_) => {
                    ctx.emit_error(DecodeError::conversion(
                        val,
                        format!("value must be between {MIN} and {MAX}"),
                    ));
                    Ok(Self::default())
                }
                Err(e) => {
                    ctx.emit_error(DecodeError::conversion(val, e));
                    Ok(Self::default())
                }
            },
            _ => {
                ctx.emit_error(DecodeError::scalar_kind(knuffel::decode::Kind::Int, val));
                Ok(Self::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[track_caller]
    fn do_parse(text: &str) -> Config {
        Config::parse("test.kdl", text)
            .map_err(miette::Report::new)
            .unwrap()
    }

    #[test]
    fn empty_config_is_default() {
        assert_eq!(do_parse(""), Config::default());
    }

    #[test]
    fn parse_full() {
        let parsed = do_parse(
            r#"
            gestures {
                drag-threshold 12
                n-touch-points 2
                trigger-edge "before"
                threshold-distance x=20 y=4.5
            }

            scaling {
                integer-scales-only
                global-scaling-factor 2
            }

            output "DP-1" {
                mode "3840x2160@59.997"
            }

            output "eDP-1" {
                off
            }
            "#,
        );

        assert_eq!(
            parsed,
            Config {
                gestures: Gestures {
                    drag_threshold: FloatOrInt(12.),
                    n_touch_points: Bounded(2),
                    trigger_edge: TriggerEdge::Before,
                    threshold_distance: ThresholdDistance {
                        x: FloatOrInt(20.),
                        y: FloatOrInt(4.5),
                    },
                },
                scaling: Scaling {
                    integer_scales_only: true,
                    global_scaling_factor: Some(Bounded(2)),
                },
                outputs: vec![
                    Output {
                        name: String::from("DP-1"),
                        off: false,
                        mode: Some(String::from("3840x2160@59.997")),
                    },
                    Output {
                        name: String::from("eDP-1"),
                        off: true,
                        mode: None,
                    },
                ],
            }
        );
    }

    #[test]
    fn gestures_defaults() {
        let parsed = do_parse("gestures {}");
        assert_eq!(parsed.gestures, Gestures::default());
        assert_eq!(parsed.gestures.drag_threshold.0, DEFAULT_DRAG_THRESHOLD);
        assert_eq!(parsed.gestures.n_touch_points, Bounded(1));
        assert_eq!(parsed.gestures.trigger_edge, TriggerEdge::None);
        assert_eq!(parsed.gestures.threshold_distance.x.0, -1.);
        assert_eq!(parsed.gestures.threshold_distance.y.0, -1.);
    }

    #[test]
    fn trigger_edge_after() {
        let parsed = do_parse(r#"gestures { trigger-edge "after"; }"#);
        assert_eq!(parsed.gestures.trigger_edge, TriggerEdge::After);
    }

    #[test]
    fn out_of_range_touch_points_is_an_error() {
        assert!(Config::parse("test.kdl", "gestures { n-touch-points 11; }").is_err());
        assert!(Config::parse("test.kdl", "gestures { n-touch-points 0; }").is_err());
    }

    #[test]
    fn out_of_range_scaling_factor_is_an_error() {
        assert!(Config::parse("test.kdl", "scaling { global-scaling-factor 5; }").is_err());
    }

    #[test]
    fn string_threshold_is_an_error() {
        assert!(Config::parse("test.kdl", r#"gestures { drag-threshold "8"; }"#).is_err());
    }

    #[test]
    fn unknown_node_is_an_error() {
        assert!(Config::parse("test.kdl", "workspace \"one\"").is_err());
    }

    #[test]
    fn output_lookup_ignores_case() {
        let parsed = do_parse(r#"output "DP-2" { off; }"#);
        assert!(parsed.output("dp-2").is_some_and(|o| o.off));
        assert!(parsed.output("DP-3").is_none());
    }
}
