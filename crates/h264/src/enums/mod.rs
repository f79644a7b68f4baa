mod aspect_ratio_idc;
mod nal_unit_type;
mod video_format;

pub use aspect_ratio_idc::*;
pub use nal_unit_type::*;
pub use video_format::*;
