//! reel_player - 后台音频播放列表
//!
//! 提供播放列表顺序器（PlaylistSequencer）、播放/展示能力抽象，
//! 以及基于 symphonia + cpal 的桌面音频引擎。

mod capability;
mod command;
mod decoder;
mod directive;
mod engine;
mod item;
mod output;
mod sequencer;

pub use capability::*;
pub use command::*;
pub use decoder::*;
pub use directive::*;
pub use engine::*;
pub use item::*;
pub use output::*;
pub use sequencer::*;
