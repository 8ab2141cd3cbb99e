//! Compensation formulas and heater encodings
//!
//! Floating point versions of the Bosch reference formulas. Raw ADC values
//! and calibration coefficients go in, physical units come out.

use airsense_core::fusion::{OperatingMode, Oversampling};

use super::calib::CalibData;

/// Heater budget per parallel-mode cycle (ms)
pub const TOTAL_HEAT_BUDGET_MS: u16 = 140;

/// Highest heater target the membrane tolerates (°C)
pub const MAX_HEATER_TEMP_C: u16 = 400;

/// Gas range correction tables for the low-range (BME680) gas ADC
const GAS_K1_RANGE: [f32; 16] = [
    0.0, 0.0, 0.0, 0.0, 0.0, -1.0, 0.0, -0.8, 0.0, 0.0, -0.2, -0.5, 0.0, -1.0, 0.0, 0.0,
];
const GAS_K2_RANGE: [f32; 16] = [
    0.0, 0.0, 0.0, 0.0, 0.1, 0.7, 0.0, -0.8, -0.1, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
];

/// Temperature (°C) and the fine temperature used by the other formulas
pub fn temperature(calib: &CalibData, temp_adc: u32) -> (f32, f32) {
    let adc = temp_adc as f32;
    let t1 = calib.par_t1 as f32;

    let var1 = ((adc / 16384.0) - (t1 / 1024.0)) * calib.par_t2 as f32;
    let x = (adc / 131072.0) - (t1 / 8192.0);
    let var2 = x * x * (calib.par_t3 as f32 * 16.0);

    let t_fine = var1 + var2;
    (t_fine / 5120.0, t_fine)
}

/// Pressure (Pa)
pub fn pressure(calib: &CalibData, t_fine: f32, pres_adc: u32) -> f32 {
    let mut var1 = (t_fine / 2.0) - 64000.0;
    let mut var2 = var1 * var1 * (calib.par_p6 as f32 / 131072.0);
    var2 += var1 * calib.par_p5 as f32 * 2.0;
    var2 = (var2 / 4.0) + (calib.par_p4 as f32 * 65536.0);
    var1 = (((calib.par_p3 as f32 * var1 * var1) / 16384.0) + (calib.par_p2 as f32 * var1))
        / 524288.0;
    var1 = (1.0 + (var1 / 32768.0)) * calib.par_p1 as f32;

    // Avoid dividing by zero on uncalibrated parts
    if var1 as i32 == 0 {
        return 0.0;
    }

    let mut pres = 1048576.0 - pres_adc as f32;
    pres = ((pres - (var2 / 4096.0)) * 6250.0) / var1;
    let var1 = (calib.par_p9 as f32 * pres * pres) / 2147483648.0;
    let var2 = pres * (calib.par_p8 as f32 / 32768.0);
    let scaled = pres / 256.0;
    let var3 = scaled * scaled * scaled * (calib.par_p10 as f32 / 131072.0);

    pres + (var1 + var2 + var3 + (calib.par_p7 as f32 * 128.0)) / 16.0
}

/// Relative humidity (%), clamped to 0..100
pub fn humidity(calib: &CalibData, t_fine: f32, hum_adc: u16) -> f32 {
    let temp_comp = t_fine / 5120.0;

    let var1 = hum_adc as f32
        - ((calib.par_h1 as f32 * 16.0) + ((calib.par_h3 as f32 / 2.0) * temp_comp));
    let var2 = var1
        * ((calib.par_h2 as f32 / 262144.0)
            * (1.0
                + ((calib.par_h4 as f32 / 16384.0) * temp_comp)
                + ((calib.par_h5 as f32 / 1048576.0) * temp_comp * temp_comp)));
    let var3 = calib.par_h6 as f32 / 16384.0;
    let var4 = calib.par_h7 as f32 / 2097152.0;

    let hum = var2 + ((var3 + (var4 * temp_comp)) * var2 * var2);
    hum.clamp(0.0, 100.0)
}

/// Gas resistance (Ohm) for the low-range ADC of the BME680
pub fn gas_resistance_low(calib: &CalibData, gas_adc: u16, gas_range: u8) -> f32 {
    let range = (gas_range & 0x0F) as usize;
    let range_factor = (1u32 << range) as f32;

    let var1 = 1340.0 + (5.0 * calib.range_sw_err as f32);
    let var2 = var1 * (1.0 + GAS_K1_RANGE[range] / 100.0);
    let var3 = 1.0 + (GAS_K2_RANGE[range] / 100.0);

    1.0 / (var3 * 0.000000125 * range_factor * (((gas_adc as f32 - 512.0) / var2) + 1.0))
}

/// Gas resistance (Ohm) for the high-range ADC of the BME688
pub fn gas_resistance_high(gas_adc: u16, gas_range: u8) -> f32 {
    let var1 = 262144u32 >> (gas_range & 0x0F);
    let var2 = 4096 + 3 * (gas_adc as i32 - 512);
    1000000.0 * var1 as f32 / var2 as f32
}

/// Heater target resistance register value for `target_c`
pub fn heater_resistance(calib: &CalibData, ambient_c: i8, target_c: u16) -> u8 {
    let target = target_c.min(MAX_HEATER_TEMP_C) as f32;

    let var1 = (calib.par_gh1 as f32 / 16.0) + 49.0;
    let var2 = ((calib.par_gh2 as f32 / 32768.0) * 0.0005) + 0.00235;
    let var3 = calib.par_gh3 as f32 / 1024.0;
    let var4 = var1 * (1.0 + (var2 * target));
    let var5 = var4 + (var3 * ambient_c as f32);

    let res_heat = 3.4
        * ((var5
            * (4.0 / (4.0 + calib.res_heat_range as f32))
            * (1.0 / (1.0 + (calib.res_heat_val as f32 * 0.002))))
            - 25.0);
    // Float-to-int casts saturate
    res_heat as u8
}

/// Encode a heater duration (ms) as 6-bit mantissa and 2-bit x4 multiplier
pub fn gas_wait(duration_ms: u16) -> u8 {
    if duration_ms >= 0xFC0 {
        return 0xFF;
    }
    encode_wait(duration_ms as u32)
}

/// Encode the shared parallel-mode heater duration (ms)
///
/// The register counts in 0.477 ms steps.
pub fn shared_heater_wait(duration_ms: u16) -> u8 {
    if duration_ms >= 0x783 {
        return 0xFF;
    }
    encode_wait(duration_ms as u32 * 1000 / 477)
}

fn encode_wait(mut value: u32) -> u8 {
    let mut factor = 0u32;
    while value > 0x3F {
        value /= 4;
        factor += 1;
    }
    (value + factor * 64) as u8
}

/// Time the device needs for one T/P/H + gas conversion (us)
pub fn measurement_duration_us(
    mode: OperatingMode,
    temperature: Oversampling,
    pressure: Oversampling,
    humidity: Oversampling,
) -> u32 {
    let cycles = temperature.cycles() + pressure.cycles() + humidity.cycles();

    let mut duration = cycles * 1963;
    duration += 477 * 4; // TPH switching
    duration += 477 * 5; // gas measurement
    if mode != OperatingMode::Parallel {
        duration += 1000; // wake up
    }
    duration
}

/// Heater time left in the parallel-mode budget once the ADC is done (ms)
///
/// Never negative: a conversion longer than the budget leaves zero.
pub fn shared_heater_duration_ms(measurement_us: u32) -> u16 {
    let measurement_ms = measurement_us / 1000;
    (TOTAL_HEAT_BUDGET_MS as u32).saturating_sub(measurement_ms) as u16
}
