//! BME68x register map

/// Chip identifier register
pub const CHIP_ID: u8 = 0xD0;
/// Expected chip identifier for BME680 and BME688
pub const CHIP_ID_BME68X: u8 = 0x61;
/// Variant identifier register
pub const VARIANT_ID: u8 = 0xF0;
/// Variant id of the BME688 (high gas range)
pub const VARIANT_GAS_HIGH: u8 = 0x01;

/// Soft reset register and command
pub const SOFT_RESET: u8 = 0xE0;
pub const SOFT_RESET_CMD: u8 = 0xB6;

/// Heater control, bit 3 switches the heater off
pub const CTRL_GAS_0: u8 = 0x70;
/// run_gas bits [5:4], nb_conv bits [3:0]
pub const CTRL_GAS_1: u8 = 0x71;
/// Humidity oversampling bits [2:0]
pub const CTRL_HUM: u8 = 0x72;
/// Temperature oversampling [7:5], pressure oversampling [4:2], mode [1:0]
pub const CTRL_MEAS: u8 = 0x74;
/// IIR filter bits [4:2]
pub const CONFIG: u8 = 0x75;

/// Heater target resistance, one register per profile step
pub const RES_HEAT_0: u8 = 0x5A;
/// Heater duration, one register per profile step
pub const GAS_WAIT_0: u8 = 0x64;
/// Shared heater duration (parallel mode)
pub const GAS_WAIT_SHARED: u8 = 0x6E;

/// First measurement field; three fields follow each other
pub const FIELD_0: u8 = 0x1D;
/// Size of one field
pub const FIELD_LEN: usize = 17;
/// Distance between field start addresses
pub const FIELD_STRIDE: u8 = 0x11;
/// Number of fields the device buffers
pub const FIELD_COUNT: u8 = 3;

/// Calibration coefficient blocks: (start register, length)
pub const CALIB_BLOCKS: [(u8, usize); 3] = [(0x8A, 23), (0xE1, 14), (0x00, 5)];
/// Total calibration length
pub const CALIB_LEN: usize = 42;

pub const MODE_MSK: u8 = 0x03;
pub const MODE_SLEEP: u8 = 0x00;
pub const MODE_FORCED: u8 = 0x01;
pub const MODE_PARALLEL: u8 = 0x02;

pub const OSRS_H_MSK: u8 = 0x07;
pub const OSRS_T_POS: u8 = 5;
pub const OSRS_P_POS: u8 = 2;
pub const OSRS_TP_MSK: u8 = 0xFC;

pub const HEAT_OFF_MSK: u8 = 0x08;
pub const RUN_GAS_MSK: u8 = 0x30;
pub const RUN_GAS_LOW: u8 = 0x10;
pub const RUN_GAS_HIGH: u8 = 0x20;
pub const NB_CONV_MSK: u8 = 0x0F;

/// Field status bits
pub const NEW_DATA_MSK: u8 = 0x80;
pub const GAS_INDEX_MSK: u8 = 0x0F;
pub const GAS_VALID_MSK: u8 = 0x20;
pub const HEAT_STAB_MSK: u8 = 0x10;
pub const GAS_RANGE_MSK: u8 = 0x0F;

/// Startup time after a soft reset (us)
pub const RESET_DELAY_US: u32 = 10_000;
/// Poll period while waiting for sleep mode or new data (us)
pub const POLL_PERIOD_US: u32 = 10_000;
/// Attempts before giving up on a mode change or field read
pub const POLL_ATTEMPTS: u8 = 5;
