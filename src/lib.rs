//! fanpost - keeps fan speed alive across tool changes in sliced G-code
//!
//! Some controllers tie `M106` fan speed to the active tool, so the fan drops
//! when `M108 T<n>` switches tools. The [`post::FanContinuity`] pass tags
//! every fan command with the active tool and re-issues the last speed after
//! each tool change.

pub mod config;
pub mod diagnostics;
pub mod document;
pub mod io;
pub mod lexer;
pub mod post;
