//! BME680 / BME688 gas sensor driver
//!
//! Register-level driver for the Bosch BME68x family. It applies whatever
//! configuration the fusion engine asks for (oversampling, heater, operating
//! mode) and returns compensated samples in physical units.
//!
//! # Mode handling
//!
//! The device only accepts configuration while asleep, so every apply first
//! forces sleep mode, waits for the device to get there, rewrites the
//! configuration and finally switches to the requested mode. Forced mode
//! then blocks for the conversion plus heating time so the following read
//! finds fresh data.
//!
//! # Variants
//!
//! The BME680 reports gas on the low-range ADC, the BME688 on the
//! high-range one. The variant register decides which field bytes and
//! which resistance formula are used.

pub mod calib;
pub mod compensate;
pub mod regs;

use airsense_core::fusion::{
    FusionRequest, OperatingMode, PhysicalSample, SampleBatch, MAX_HEATER_PROFILE_LEN,
};
use airsense_core::traits::{DriverError, SensorDriver};

use crate::bus::RegisterBus;

pub use calib::CalibData;
use compensate::{
    gas_resistance_high, gas_resistance_low, gas_wait, heater_resistance,
    measurement_duration_us, shared_heater_duration_ms, shared_heater_wait,
};
use regs::*;

/// Chip variant, decided by the variant id register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Variant {
    /// Low gas range ADC
    #[default]
    Bme680,
    /// High gas range ADC
    Bme688,
}

impl Variant {
    fn from_id(variant_id: u8) -> Self {
        if variant_id == VARIANT_GAS_HIGH {
            Variant::Bme688
        } else {
            Variant::Bme680
        }
    }

    /// run_gas bits enabling this variant's gas conversion
    fn run_gas(self) -> u8 {
        match self {
            Variant::Bme680 => RUN_GAS_LOW,
            Variant::Bme688 => RUN_GAS_HIGH,
        }
    }
}

/// BME68x on a [`RegisterBus`]
pub struct Bme68x<B> {
    bus: B,
    calib: CalibData,
    variant: Variant,
    /// Ambient temperature used for heater resistance calculation (°C)
    ambient_temp_c: i8,
    mode: OperatingMode,
    initialized: bool,
}

impl<B: RegisterBus> Bme68x<B> {
    /// Create a driver; `ambient_temp_c` seeds the heater calculation
    /// until the first temperature reading arrives
    pub fn new(bus: B, ambient_temp_c: i8) -> Self {
        Self {
            bus,
            calib: CalibData::default(),
            variant: Variant::default(),
            ambient_temp_c,
            mode: OperatingMode::Sleep,
            initialized: false,
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn calibration(&self) -> &CalibData {
        &self.calib
    }

    pub fn ambient_temperature(&self) -> i8 {
        self.ambient_temp_c
    }

    /// Mode the device was last switched to
    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    /// Give back the bus
    pub fn release(self) -> B {
        self.bus
    }

    fn read_reg(&mut self, reg: u8) -> Result<u8, DriverError> {
        let mut value = [0u8; 1];
        self.read_regs(reg, &mut value)?;
        Ok(value[0])
    }

    fn read_regs(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), DriverError> {
        self.bus
            .read_registers(reg, buf)
            .map_err(|_| DriverError::Bus)
    }

    fn write_regs(&mut self, reg: u8, data: &[u8]) -> Result<(), DriverError> {
        self.bus
            .write_registers(reg, data)
            .map_err(|_| DriverError::Bus)
    }

    /// Switch operating mode, passing through sleep first
    fn set_mode(&mut self, mode: OperatingMode) -> Result<(), DriverError> {
        let mut attempts = 0;
        loop {
            let ctrl_meas = self.read_reg(CTRL_MEAS)?;
            if ctrl_meas & MODE_MSK == MODE_SLEEP {
                let bits = match mode {
                    OperatingMode::Sleep => MODE_SLEEP,
                    OperatingMode::Forced => MODE_FORCED,
                    OperatingMode::Parallel => MODE_PARALLEL,
                };
                if bits != MODE_SLEEP {
                    self.write_regs(CTRL_MEAS, &[ctrl_meas | bits])?;
                }
                self.mode = mode;
                return Ok(());
            }

            attempts += 1;
            if attempts > POLL_ATTEMPTS {
                return Err(DriverError::Timeout);
            }
            self.write_regs(CTRL_MEAS, &[ctrl_meas & !MODE_MSK])?;
            self.bus.delay_us(POLL_PERIOD_US);
        }
    }

    /// Oversampling for temperature, pressure and humidity
    fn configure_tph(&mut self, request: &FusionRequest) -> Result<(), DriverError> {
        // CTRL_GAS_1 ..= CONFIG
        let mut ctrl = [0u8; 5];
        self.read_regs(CTRL_GAS_1, &mut ctrl)?;

        let ctrl_hum = (ctrl[1] & !OSRS_H_MSK) | request.humidity_oversampling.bits();
        let ctrl_meas = (ctrl[3] & !OSRS_TP_MSK)
            | (request.temperature_oversampling.bits() << OSRS_T_POS)
            | (request.pressure_oversampling.bits() << OSRS_P_POS);

        // Humidity settings only latch on the following CTRL_MEAS write
        self.write_regs(CTRL_HUM, &[ctrl_hum])?;
        self.write_regs(CTRL_MEAS, &[ctrl_meas])
    }

    fn configure_heater(&mut self, request: &FusionRequest) -> Result<(), DriverError> {
        let heater = &request.heater;
        let (run_gas, nb_conv) = if !heater.enabled {
            (0, 0)
        } else {
            match request.mode {
                OperatingMode::Forced => {
                    let res_heat =
                        heater_resistance(&self.calib, self.ambient_temp_c, heater.temperature_c);
                    self.write_regs(RES_HEAT_0, &[res_heat])?;
                    self.write_regs(GAS_WAIT_0, &[gas_wait(heater.duration_ms)])?;
                    (self.variant.run_gas(), 0)
                }
                OperatingMode::Parallel => {
                    let len = heater.profile.len();
                    if len == 0 || len > MAX_HEATER_PROFILE_LEN {
                        return Err(DriverError::InvalidSettings);
                    }

                    let mut res_heat = [0u8; MAX_HEATER_PROFILE_LEN];
                    let mut wait = [0u8; MAX_HEATER_PROFILE_LEN];
                    for (i, step) in heater.profile.iter().enumerate() {
                        res_heat[i] =
                            heater_resistance(&self.calib, self.ambient_temp_c, step.temperature_c);
                        wait[i] = step.duration_multiplier.min(u8::MAX as u16) as u8;
                    }
                    self.write_regs(RES_HEAT_0, &res_heat[..len])?;
                    self.write_regs(GAS_WAIT_0, &wait[..len])?;

                    let measurement = measurement_duration_us(
                        OperatingMode::Parallel,
                        request.temperature_oversampling,
                        request.pressure_oversampling,
                        request.humidity_oversampling,
                    );
                    let shared = shared_heater_wait(shared_heater_duration_ms(measurement));
                    self.write_regs(GAS_WAIT_SHARED, &[shared])?;

                    (self.variant.run_gas(), len as u8)
                }
                OperatingMode::Sleep => (0, 0),
            }
        };

        let mut ctrl_gas = [0u8; 2];
        self.read_regs(CTRL_GAS_0, &mut ctrl_gas)?;
        if heater.enabled {
            ctrl_gas[0] &= !HEAT_OFF_MSK;
        } else {
            ctrl_gas[0] |= HEAT_OFF_MSK;
        }
        ctrl_gas[1] = (ctrl_gas[1] & !(RUN_GAS_MSK | NB_CONV_MSK)) | run_gas | (nb_conv & NB_CONV_MSK);
        self.write_regs(CTRL_GAS_0, &ctrl_gas)
    }

    fn read_field(&mut self, index: u8) -> Result<[u8; FIELD_LEN], DriverError> {
        let mut raw = [0u8; FIELD_LEN];
        self.read_regs(FIELD_0 + index * FIELD_STRIDE, &mut raw)?;
        Ok(raw)
    }

    /// Compensate one raw field, `None` when it holds no new data
    fn parse_field(&self, raw: &[u8; FIELD_LEN]) -> Option<PhysicalSample> {
        if raw[0] & NEW_DATA_MSK == 0 {
            return None;
        }

        let pres_adc = ((raw[2] as u32) << 12) | ((raw[3] as u32) << 4) | ((raw[4] as u32) >> 4);
        let temp_adc = ((raw[5] as u32) << 12) | ((raw[6] as u32) << 4) | ((raw[7] as u32) >> 4);
        let hum_adc = u16::from_be_bytes([raw[8], raw[9]]);

        let (gas_msb, gas_lsb) = match self.variant {
            Variant::Bme680 => (raw[13], raw[14]),
            Variant::Bme688 => (raw[15], raw[16]),
        };
        let gas_adc = ((gas_msb as u16) << 2) | ((gas_lsb as u16) >> 6);
        let gas_range = gas_lsb & GAS_RANGE_MSK;
        let gas_valid = gas_lsb & GAS_VALID_MSK != 0;

        let (temperature, t_fine) = compensate::temperature(&self.calib, temp_adc);
        let gas_resistance = if !gas_valid {
            0.0
        } else {
            match self.variant {
                Variant::Bme680 => gas_resistance_low(&self.calib, gas_adc, gas_range),
                Variant::Bme688 => gas_resistance_high(gas_adc, gas_range),
            }
        };

        Some(PhysicalSample {
            timestamp_ns: 0,
            temperature,
            humidity: compensate::humidity(&self.calib, t_fine, hum_adc),
            pressure: compensate::pressure(&self.calib, t_fine, pres_adc),
            gas_resistance,
            gas_index: raw[0] & GAS_INDEX_MSK,
            meas_index: raw[1],
            gas_valid,
            heater_stable: gas_lsb & HEAT_STAB_MSK != 0,
        })
    }

    fn read_forced(&mut self, samples: &mut SampleBatch) -> Result<(), DriverError> {
        for _ in 0..POLL_ATTEMPTS {
            let raw = self.read_field(0)?;
            if let Some(sample) = self.parse_field(&raw) {
                let _ = samples.push(sample);
                return Ok(());
            }
            self.bus.delay_us(POLL_PERIOD_US);
        }
        Ok(())
    }

    fn read_parallel(&mut self, samples: &mut SampleBatch) -> Result<(), DriverError> {
        for index in 0..FIELD_COUNT {
            let raw = self.read_field(index)?;
            if let Some(sample) = self.parse_field(&raw) {
                // Capacity equals the number of fields
                let _ = samples.push(sample);
            }
        }
        samples.sort_unstable_by_key(|s| s.meas_index);
        Ok(())
    }
}

impl<B: RegisterBus> SensorDriver for Bme68x<B> {
    fn init(&mut self) -> Result<(), DriverError> {
        self.initialized = false;

        self.write_regs(SOFT_RESET, &[SOFT_RESET_CMD])?;
        self.bus.delay_us(RESET_DELAY_US);

        let chip_id = self.read_reg(CHIP_ID)?;
        if chip_id != CHIP_ID_BME68X {
            return Err(DriverError::ChipNotFound(chip_id));
        }
        self.variant = Variant::from_id(self.read_reg(VARIANT_ID)?);

        let mut raw = [0u8; CALIB_LEN];
        let mut offset = 0;
        for (reg, len) in CALIB_BLOCKS {
            self.read_regs(reg, &mut raw[offset..offset + len])?;
            offset += len;
        }
        self.calib = CalibData::from_bytes(&raw);

        self.mode = OperatingMode::Sleep;
        self.initialized = true;
        Ok(())
    }

    fn apply_settings(&mut self, request: &FusionRequest) -> Result<(), DriverError> {
        if !self.initialized {
            return Err(DriverError::NotInitialized);
        }

        self.set_mode(OperatingMode::Sleep)?;
        if request.mode == OperatingMode::Sleep {
            return Ok(());
        }

        self.configure_tph(request)?;
        self.configure_heater(request)?;
        self.set_mode(request.mode)?;

        if request.mode == OperatingMode::Forced {
            let mut wait_us = measurement_duration_us(
                OperatingMode::Forced,
                request.temperature_oversampling,
                request.pressure_oversampling,
                request.humidity_oversampling,
            );
            if request.heater.enabled {
                wait_us += request.heater.duration_ms as u32 * 1000;
            }
            self.bus.delay_us(wait_us);
        }
        Ok(())
    }

    fn read_fields(&mut self) -> Result<SampleBatch, DriverError> {
        if !self.initialized {
            return Err(DriverError::NotInitialized);
        }

        let mut samples = SampleBatch::new();
        match self.mode {
            OperatingMode::Sleep => {}
            OperatingMode::Forced => self.read_forced(&mut samples)?,
            OperatingMode::Parallel => self.read_parallel(&mut samples)?,
        }

        if let Some(last) = samples.last() {
            self.ambient_temp_c = last.temperature.clamp(-40.0, 85.0) as i8;
        }
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airsense_core::fusion::{HeaterSettings, HeaterStep, Oversampling};
    use airsense_hal::I2cBusError;

    /// 256-byte register file standing in for the device
    struct RegisterFile {
        regs: [u8; 256],
        writes: Vec<(u8, Vec<u8>)>,
        delay_us: u64,
        fail: bool,
    }

    impl RegisterFile {
        fn new() -> Self {
            let mut regs = [0u8; 256];
            regs[CHIP_ID as usize] = CHIP_ID_BME68X;
            regs[VARIANT_ID as usize] = VARIANT_GAS_HIGH;
            // T2 = 16384, P1 = 1, H2 = 2048
            regs[0x8B] = 0x40;
            regs[0x8E] = 0x01;
            regs[0xE1] = 0x80;
            Self {
                regs,
                writes: Vec::new(),
                delay_us: 0,
                fail: false,
            }
        }

        /// Field that compensates to 25 °C, 100 kPa, 45 %, 1 MOhm (high range)
        fn load_field(&mut self, index: u8, meas_index: u8, gas_index: u8) {
            let base = (FIELD_0 + index * FIELD_STRIDE) as usize;
            let field = [
                NEW_DATA_MSK | gas_index,
                meas_index,
                0xFF, 0xFF, 0x00, // pressure adc 1048560
                0x1F, 0x40, 0x00, // temperature adc 128000
                0x16, 0x80, // humidity adc 5760
                0, 0, 0,
                0x80, 0x30, // low range gas adc 512, range 0
                0x80, 0x36, // high range gas adc 512, range 6
            ];
            self.regs[base..base + FIELD_LEN].copy_from_slice(&field);
        }

        fn written(&self, reg: u8) -> Vec<&Vec<u8>> {
            self.writes
                .iter()
                .filter(|(r, _)| *r == reg)
                .map(|(_, data)| data)
                .collect()
        }
    }

    impl RegisterBus for RegisterFile {
        fn write_registers(&mut self, reg: u8, data: &[u8]) -> Result<(), I2cBusError> {
            if self.fail {
                return Err(I2cBusError::Nack);
            }
            for (i, value) in data.iter().enumerate() {
                self.regs[reg as usize + i] = *value;
            }
            self.writes.push((reg, data.to_vec()));
            Ok(())
        }

        fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), I2cBusError> {
            if self.fail {
                return Err(I2cBusError::Nack);
            }
            let start = reg as usize;
            buf.copy_from_slice(&self.regs[start..start + buf.len()]);
            Ok(())
        }

        fn delay_us(&mut self, us: u32) {
            self.delay_us += us as u64;
        }
    }

    fn forced_request() -> FusionRequest {
        FusionRequest {
            next_call_ns: 0,
            mode: OperatingMode::Forced,
            temperature_oversampling: Oversampling::X2,
            pressure_oversampling: Oversampling::X16,
            humidity_oversampling: Oversampling::X1,
            heater: HeaterSettings {
                enabled: true,
                temperature_c: 320,
                duration_ms: 197,
                profile: heapless::Vec::new(),
            },
            trigger_measurement: true,
            ..Default::default()
        }
    }

    fn parallel_request(steps: &[(u16, u16)]) -> FusionRequest {
        let mut request = forced_request();
        request.mode = OperatingMode::Parallel;
        for &(temperature_c, duration_multiplier) in steps {
            request
                .heater
                .profile
                .push(HeaterStep {
                    temperature_c,
                    duration_multiplier,
                })
                .unwrap();
        }
        request
    }

    fn ready_sensor() -> Bme68x<RegisterFile> {
        let mut sensor = Bme68x::new(RegisterFile::new(), 25);
        sensor.init().unwrap();
        sensor
    }

    #[test]
    fn test_init_resets_and_loads_calibration() {
        let sensor = ready_sensor();
        assert_eq!(sensor.variant(), Variant::Bme688);
        assert_eq!(sensor.calibration().par_t2, 16384);
        assert_eq!(sensor.calibration().par_p1, 1);
        assert_eq!(sensor.calibration().par_h2, 2048);

        let bus = sensor.release();
        assert_eq!(bus.writes[0], (SOFT_RESET, vec![SOFT_RESET_CMD]));
        assert_eq!(bus.delay_us, RESET_DELAY_US as u64);
    }

    #[test]
    fn test_init_rejects_unknown_chip() {
        let mut bus = RegisterFile::new();
        bus.regs[CHIP_ID as usize] = 0x60;
        let mut sensor = Bme68x::new(bus, 25);
        assert_eq!(sensor.init(), Err(DriverError::ChipNotFound(0x60)));
        assert_eq!(
            sensor.apply_settings(&forced_request()),
            Err(DriverError::NotInitialized)
        );
    }

    #[test]
    fn test_low_range_variant() {
        let mut bus = RegisterFile::new();
        bus.regs[VARIANT_ID as usize] = 0x00;
        let mut sensor = Bme68x::new(bus, 25);
        sensor.init().unwrap();
        assert_eq!(sensor.variant(), Variant::Bme680);
    }

    #[test]
    fn test_not_initialized() {
        let mut sensor = Bme68x::new(RegisterFile::new(), 25);
        assert_eq!(
            sensor.apply_settings(&forced_request()),
            Err(DriverError::NotInitialized)
        );
        assert_eq!(sensor.read_fields(), Err(DriverError::NotInitialized));
    }

    #[test]
    fn test_forced_settings() {
        let mut sensor = ready_sensor();
        sensor.apply_settings(&forced_request()).unwrap();
        let expected_res_heat = heater_resistance(sensor.calibration(), 25, 320);
        assert_eq!(sensor.mode(), OperatingMode::Forced);

        let bus = sensor.release();
        assert_eq!(bus.regs[CTRL_HUM as usize], 0x01);
        // T x2, P x16, forced
        assert_eq!(bus.regs[CTRL_MEAS as usize], 0x55);
        assert_eq!(bus.regs[RES_HEAT_0 as usize], expected_res_heat);
        assert_eq!(bus.regs[GAS_WAIT_0 as usize], gas_wait(197));
        assert_eq!(bus.regs[CTRL_GAS_0 as usize] & HEAT_OFF_MSK, 0);
        assert_eq!(bus.regs[CTRL_GAS_1 as usize], RUN_GAS_HIGH);
        // Reset, then conversion plus heating
        assert_eq!(
            bus.delay_us,
            RESET_DELAY_US as u64 + 42_590 + 197_000
        );
    }

    #[test]
    fn test_apply_waits_for_sleep() {
        let mut sensor = ready_sensor();
        sensor.apply_settings(&forced_request()).unwrap();
        // The register file never drops back to sleep on its own
        sensor.apply_settings(&forced_request()).unwrap();

        let bus = sensor.release();
        let sleep_writes = bus
            .written(CTRL_MEAS)
            .into_iter()
            .filter(|data| data[0] & MODE_MSK == MODE_SLEEP)
            .count();
        assert!(sleep_writes >= 1);
        assert_eq!(bus.regs[CTRL_MEAS as usize] & MODE_MSK, MODE_FORCED);
    }

    #[test]
    fn test_parallel_settings() {
        let mut sensor = ready_sensor();
        let request = parallel_request(&[(320, 5), (100, 2), (200, 10)]);
        sensor.apply_settings(&request).unwrap();
        assert_eq!(sensor.mode(), OperatingMode::Parallel);

        let bus = sensor.release();
        assert_eq!(bus.regs[CTRL_MEAS as usize] & MODE_MSK, MODE_PARALLEL);
        assert_eq!(&bus.regs[GAS_WAIT_0 as usize..GAS_WAIT_0 as usize + 3], &[5, 2, 10]);
        assert!(bus.regs[RES_HEAT_0 as usize] > bus.regs[RES_HEAT_0 as usize + 1]);
        // 140 ms budget minus a 41 ms conversion
        assert_eq!(bus.regs[GAS_WAIT_SHARED as usize], shared_heater_wait(99));
        assert_eq!(bus.regs[CTRL_GAS_1 as usize], RUN_GAS_HIGH | 3);
        // No blocking wait in parallel mode
        assert_eq!(bus.delay_us, RESET_DELAY_US as u64);
    }

    #[test]
    fn test_parallel_without_profile_is_invalid() {
        let mut sensor = ready_sensor();
        assert_eq!(
            sensor.apply_settings(&parallel_request(&[])),
            Err(DriverError::InvalidSettings)
        );
    }

    #[test]
    fn test_heater_disabled() {
        let mut sensor = ready_sensor();
        let mut request = forced_request();
        request.heater.enabled = false;
        sensor.apply_settings(&request).unwrap();

        let bus = sensor.release();
        assert_ne!(bus.regs[CTRL_GAS_0 as usize] & HEAT_OFF_MSK, 0);
        assert_eq!(bus.regs[CTRL_GAS_1 as usize] & RUN_GAS_MSK, 0);
        assert!(bus.written(RES_HEAT_0).is_empty());
        assert_eq!(bus.delay_us, RESET_DELAY_US as u64 + 42_590);
    }

    #[test]
    fn test_sleep_request_only_sleeps() {
        let mut sensor = ready_sensor();
        let request = FusionRequest::default();
        sensor.apply_settings(&request).unwrap();
        assert_eq!(sensor.mode(), OperatingMode::Sleep);
        assert!(sensor.read_fields().unwrap().is_empty());
        assert!(sensor.release().written(CTRL_HUM).is_empty());
    }

    #[test]
    fn test_forced_read_compensates() {
        let mut sensor = ready_sensor();
        sensor.apply_settings(&forced_request()).unwrap();
        sensor.bus.load_field(0, 0, 0);

        let samples = sensor.read_fields().unwrap();
        assert_eq!(samples.len(), 1);
        let sample = samples[0];
        assert_eq!(sample.temperature, 25.0);
        assert_eq!(sample.pressure, 100_000.0);
        assert_eq!(sample.humidity, 45.0);
        assert_eq!(sample.gas_resistance, 1_000_000.0);
        assert!(sample.gas_valid);
        assert!(sample.heater_stable);
        assert_eq!(sensor.ambient_temperature(), 25);
    }

    #[test]
    fn test_forced_read_without_new_data() {
        let mut sensor = ready_sensor();
        sensor.apply_settings(&forced_request()).unwrap();
        let before = sensor.bus.delay_us;

        assert!(sensor.read_fields().unwrap().is_empty());
        assert_eq!(
            sensor.bus.delay_us - before,
            POLL_ATTEMPTS as u64 * POLL_PERIOD_US as u64
        );
    }

    #[test]
    fn test_invalid_gas_reads_zero() {
        let mut sensor = ready_sensor();
        sensor.apply_settings(&forced_request()).unwrap();
        sensor.bus.load_field(0, 0, 0);
        sensor.bus.regs[FIELD_0 as usize + 16] &= !GAS_VALID_MSK;

        let samples = sensor.read_fields().unwrap();
        assert!(!samples[0].gas_valid);
        assert_eq!(samples[0].gas_resistance, 0.0);
    }

    #[test]
    fn test_parallel_read_orders_by_meas_index() {
        let mut sensor = ready_sensor();
        sensor
            .apply_settings(&parallel_request(&[(320, 5), (100, 2), (200, 10)]))
            .unwrap();
        sensor.bus.load_field(0, 7, 2);
        sensor.bus.load_field(1, 3, 0);
        sensor.bus.load_field(2, 5, 1);
        // Field 2 was already read out
        sensor.bus.regs[(FIELD_0 + 2 * FIELD_STRIDE) as usize] &= !NEW_DATA_MSK;

        let samples = sensor.read_fields().unwrap();
        let order: Vec<(u8, u8)> = samples.iter().map(|s| (s.meas_index, s.gas_index)).collect();
        assert_eq!(order, vec![(3, 0), (7, 2)]);
    }

    #[test]
    fn test_bus_failure() {
        let mut sensor = ready_sensor();
        sensor.bus.fail = true;
        assert_eq!(
            sensor.apply_settings(&forced_request()),
            Err(DriverError::Bus)
        );
        assert_eq!(sensor.init(), Err(DriverError::Bus));
    }
}
