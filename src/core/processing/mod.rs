pub mod pipeline;
pub mod pixelate;
pub mod region;
pub mod resize;
pub mod sizer;
pub mod smooth;
