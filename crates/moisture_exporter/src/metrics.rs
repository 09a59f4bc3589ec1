//! Prometheus gauges for pumps and moisture sensors.
//!
//! Live readings and calibration bounds are separate gauge families so a
//! dashboard can plot `sensor_value` against `sensor_dry`/`sensor_wet` on the
//! same axis. The `connected` label carries the unplugged-probe signal.

use prometheus::Encoder;
use prometheus::Gauge;
use prometheus::GaugeVec;
use prometheus::Opts;
use prometheus::Registry;
use prometheus::TextEncoder;
#[cfg(target_os = "linux")]
use prometheus::process_collector::ProcessCollector;

use crate::resources::MoistureSensor;
use crate::resources::ResourceSnapshot;

const SENSOR_LABELS: &[&str] = &["sensor", "plant", "connected"];

#[derive(Debug, thiserror::Error)]
#[error("Metrics registry error: {0}")]
pub struct MetricsError(#[from] prometheus::Error);

/// Registry holding every gauge this exporter serves.
///
/// Shared between the scrape path, which writes, and the `/metrics` handler,
/// which renders. The gauge vectors synchronize internally so `&self` is
/// enough for both.
pub struct Metrics {
    registry: Registry,
    pump_state: GaugeVec,
    sensor_value: GaugeVec,
    sensor_dry: GaugeVec,
    sensor_wet: GaugeVec,
    sensor_threshold: GaugeVec,
    scrape_success: Gauge,
}

impl Metrics {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let pump_state = GaugeVec::new(
            Opts::new("pump_state", "Pump state (1 = ON, 0 = OFF)"),
            &["pump"],
        )?;
        let sensor_value = GaugeVec::new(
            Opts::new("sensor_value", "Current moisture sensor value"),
            SENSOR_LABELS,
        )?;
        let sensor_dry = GaugeVec::new(
            Opts::new("sensor_dry", "Dry calibration value"),
            SENSOR_LABELS,
        )?;
        let sensor_wet = GaugeVec::new(
            Opts::new("sensor_wet", "Wet calibration value"),
            SENSOR_LABELS,
        )?;
        let sensor_threshold = GaugeVec::new(
            Opts::new("sensor_threshold", "Threshold value"),
            SENSOR_LABELS,
        )?;
        let scrape_success = Gauge::new(
            "scrape_success",
            "Whether the last scrape of the device succeeded (1 = yes, 0 = no)",
        )?;

        registry.register(Box::new(pump_state.clone()))?;
        registry.register(Box::new(sensor_value.clone()))?;
        registry.register(Box::new(sensor_dry.clone()))?;
        registry.register(Box::new(sensor_wet.clone()))?;
        registry.register(Box::new(sensor_threshold.clone()))?;
        registry.register(Box::new(scrape_success.clone()))?;

        // Process CPU, memory and file descriptor series, as a stock exporter has
        #[cfg(target_os = "linux")]
        registry.register(Box::new(ProcessCollector::for_self()))?;

        Ok(Self {
            registry,
            pump_state,
            sensor_value,
            sensor_dry,
            sensor_wet,
            sensor_threshold,
            scrape_success,
        })
    }

    /// Overwrite the gauges with the values in `snapshot`.
    ///
    /// Series not present in the snapshot keep their previous value.
    pub fn publish(&self, snapshot: &ResourceSnapshot) {
        for pump in &snapshot.pumps {
            let index = pump.index.to_string();
            let value = if pump.on { 1.0 } else { 0.0 };
            self.pump_state
                .with_label_values(&[index.as_str()])
                .set(value);
        }

        for sensor in &snapshot.sensors {
            self.publish_sensor(sensor);
        }
    }

    fn publish_sensor(&self, sensor: &MoistureSensor) {
        let index = sensor.index.to_string();
        let plant = sensor.plant_id.to_string();
        let connected = sensor.is_connected().to_string();
        let labels = [index.as_str(), plant.as_str(), connected.as_str()];

        self.sensor_value
            .with_label_values(&labels)
            .set(sensor.value as f64);
        self.sensor_dry
            .with_label_values(&labels)
            .set(sensor.dry_calibration as f64);
        self.sensor_wet
            .with_label_values(&labels)
            .set(sensor.wet_calibration as f64);
        self.sensor_threshold
            .with_label_values(&labels)
            .set(sensor.threshold as f64);
    }

    /// Record whether the latest fetch/decode/publish cycle went through
    pub fn record_scrape(&self, success: bool) {
        self.scrape_success.set(if success { 1.0 } else { 0.0 });
    }

    /// Content type of [`Metrics::render`] output
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }

    /// Encode every registered family in the Prometheus text format
    pub fn render(&self) -> Result<String, MetricsError> {
        let mut buffer = String::new();
        TextEncoder::new().encode_utf8(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }

    #[cfg(test)]
    pub(crate) fn registry(&self) -> &Registry {
        &self.registry
    }
}
