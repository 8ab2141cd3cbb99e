//! Factory calibration coefficients
//!
//! Every chip carries its own trimming parameters in three non-contiguous
//! register blocks. They are read once at init and feed all compensation
//! formulas.

use super::regs::CALIB_LEN;

/// Calibration coefficients as laid out by Bosch
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibData {
    pub par_t1: u16,
    pub par_t2: i16,
    pub par_t3: i8,
    pub par_p1: u16,
    pub par_p2: i16,
    pub par_p3: i8,
    pub par_p4: i16,
    pub par_p5: i16,
    pub par_p6: i8,
    pub par_p7: i8,
    pub par_p8: i16,
    pub par_p9: i16,
    pub par_p10: u8,
    pub par_h1: u16,
    pub par_h2: u16,
    pub par_h3: i8,
    pub par_h4: i8,
    pub par_h5: i8,
    pub par_h6: u8,
    pub par_h7: i8,
    pub par_gh1: i8,
    pub par_gh2: i16,
    pub par_gh3: i8,
    pub res_heat_val: i8,
    pub res_heat_range: u8,
    pub range_sw_err: i8,
}

fn u16_le(raw: &[u8; CALIB_LEN], lsb: usize) -> u16 {
    u16::from_le_bytes([raw[lsb], raw[lsb + 1]])
}

fn i16_le(raw: &[u8; CALIB_LEN], lsb: usize) -> i16 {
    i16::from_le_bytes([raw[lsb], raw[lsb + 1]])
}

impl CalibData {
    /// Decode the concatenated 0x8A, 0xE1 and 0x00 blocks
    pub fn from_bytes(raw: &[u8; CALIB_LEN]) -> Self {
        Self {
            par_t2: i16_le(raw, 0),
            par_t3: raw[2] as i8,
            par_p1: u16_le(raw, 4),
            par_p2: i16_le(raw, 6),
            par_p3: raw[8] as i8,
            par_p4: i16_le(raw, 10),
            par_p5: i16_le(raw, 12),
            par_p7: raw[14] as i8,
            par_p6: raw[15] as i8,
            par_p8: i16_le(raw, 18),
            par_p9: i16_le(raw, 20),
            par_p10: raw[22],
            // H1 and H2 share the nibbles of byte 24
            par_h2: ((raw[23] as u16) << 4) | ((raw[24] as u16) >> 4),
            par_h1: ((raw[25] as u16) << 4) | ((raw[24] as u16) & 0x0F),
            par_h3: raw[26] as i8,
            par_h4: raw[27] as i8,
            par_h5: raw[28] as i8,
            par_h6: raw[29],
            par_h7: raw[30] as i8,
            par_t1: u16_le(raw, 31),
            par_gh2: i16_le(raw, 33),
            par_gh1: raw[35] as i8,
            par_gh3: raw[36] as i8,
            res_heat_val: raw[37] as i8,
            res_heat_range: (raw[39] & 0x30) >> 4,
            range_sw_err: ((raw[41] & 0xF0) as i8) / 16,
        }
    }
}
