//! 扫描编排模块

pub mod aggregator;
pub mod global;
pub mod orchestrator;
pub mod progress;
pub mod renderer;

pub use self::aggregator::{compute_global_score, weighted_score};
pub use self::global::{init_scanner, init_scanner_with_config, scan};
pub use self::orchestrator::{Scanner, decide_winner};
pub use self::progress::{ProgressEvent, step};
pub use self::renderer::{HttpRenderer, NoRenderer, RenderedPage, Renderer, StaticRenderer};
