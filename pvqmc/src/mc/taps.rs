#[rustfmt::skip]
pub const LUMA_6TAP: [[i32; 6]; 4] = [
    [0,   0, 128,   0,   0, 0],
    [3, -15, 111,  37, -10, 2],
    [3, -17,  78,  78, -17, 3],
    [2, -10,  37, 111, -15, 3],
];

#[rustfmt::skip]
pub const LUMA_8TAP: [[i32; 8]; 4] = [
    [ 0, 0,   0, 64,  0,   0, 0,  0],
    [-1, 4, -10, 58, 17,  -5, 1,  0],
    [-1, 4, -11, 40, 40, -11, 4, -1],
    [ 0, 1,  -5, 17, 58, -10, 4, -1],
];

#[rustfmt::skip]
pub const CHROMA_4TAP: [[i32; 4]; 8] = [
    [ 0, 64,  0,  0],
    [-2, 58, 10, -2],
    [-4, 54, 16, -2],
    [-4, 44, 28, -4],
    [-4, 36, 36, -4],
    [-4, 28, 44, -4],
    [-2, 16, 54, -4],
    [-2, 10, 58, -2],
];

// Takes the place of the 6-tap filter at the half/half phase.
#[rustfmt::skip]
pub const LUMA_CENTER: [[i32; 4]; 4] = [
    [0, 1, 1, 0],
    [1, 2, 2, 1],
    [1, 2, 2, 1],
    [0, 1, 1, 0],
];

pub const LUMA_6TAP_SHIFT: u32 = 14;
pub const LUMA_8TAP_SHIFT: u32 = 12;
pub const CHROMA_SHIFT: u32 = 12;
pub const CENTER_SHIFT: u32 = 4;

pub const LUMA_PHASES: usize = 4;
pub const CHROMA_PHASES: usize = 8;
