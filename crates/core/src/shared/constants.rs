/// Grid size for block-mean pixelation (cells per axis).
pub const DEFAULT_PIXELATION_BLOCKS: u32 = 10;

/// Horizontal expansion margin is `frame_width / this`.
pub const DEFAULT_MARGIN_WIDTH_DIVISOR: u32 = 250;

/// Vertical expansion margin is `frame_height / this`.
pub const DEFAULT_MARGIN_HEIGHT_DIVISOR: u32 = 100;

/// A detection stays active for `fps / this` frames after its timestamp's frame.
pub const DEFAULT_WINDOW_DIVISOR: f64 = 2.0;

/// Upper bound on buffered lookahead frames (ten seconds at 30 fps).
pub const MAX_LOOKAHEAD_FRAMES: usize = 300;

pub const DEFAULT_GAUSSIAN_KERNEL_SIZE: usize = 99;
pub const DEFAULT_GAUSSIAN_SIGMA: f64 = 30.0;

/// RGB blue, the outline color of the historical debug overlay.
pub const DEFAULT_OUTLINE_COLOR: [u8; 3] = [0, 0, 255];
pub const DEFAULT_OUTLINE_THICKNESS: u32 = 3;

pub const SCRATCH_DIR_NAME: &str = "Video Redact";
