//! Sample to engine-input conversion
//!
//! The engine's previous `schedule` call decides which inputs it wants;
//! only those are emitted, always in the same order.

use super::types::{
    FusionInput, FusionRequest, InputBatch, OperatingMode, PhysicalInput, PhysicalSample,
};

/// Convert one device sample into the inputs required by `request`
///
/// Emission order is fixed: heat-source offset, temperature, humidity,
/// pressure, gas resistance, heater profile step. The profile step is zero
/// outside parallel mode.
pub fn samples_to_inputs(
    request: &FusionRequest,
    sample: &PhysicalSample,
    timestamp_ns: i64,
    heat_source_offset_c: f32,
) -> InputBatch {
    let required = request.required_inputs;
    let profile_part = if request.mode == OperatingMode::Parallel {
        sample.gas_index as f32
    } else {
        0.0
    };

    let candidates = [
        (PhysicalInput::HeatSource, heat_source_offset_c),
        (PhysicalInput::Temperature, sample.temperature),
        (PhysicalInput::Humidity, sample.humidity),
        (PhysicalInput::Pressure, sample.pressure),
        (PhysicalInput::GasResistor, sample.gas_resistance),
        (PhysicalInput::ProfilePart, profile_part),
    ];

    let mut inputs = InputBatch::new();
    for (input, signal) in candidates {
        if required.contains(input) {
            // Capacity equals the number of candidates
            let _ = inputs.push(FusionInput {
                input,
                signal,
                timestamp_ns,
            });
        }
    }
    inputs
}
