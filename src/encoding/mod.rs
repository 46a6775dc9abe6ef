pub mod format;
pub mod keycode;
pub mod reference;

pub use keycode::{
    build_set_key, decode_score, encode_score, has_separator, prefix_end, score_of, set_prefix,
    set_score_prefix, SCORE_SIZE, SET_SEPARATOR,
};
pub use reference::Reference;
