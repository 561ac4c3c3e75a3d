//! An in-memory board for exercising runs without hardware.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::{ClockConfig, ControlPinSetting};
use crate::core::{CalibrationMask, Framer, GainTarget, LaneInfo, ObsRxSource, RfPll, TxChannel};
use crate::drivers::{
    Board, CalibrationStatus, ClockSource, ConverterParams, DataConverter, DataPathDriver,
    DigitalLink, DmaChannel, DmaParams, FirmwareVersion, FrequencySynth, LinkDriver, LinkParams,
    Platform, PlatformSession, SerdesDriver, SerdesLaneGroup, SerdesParams, SynthDriver,
    SynthParams, Transceiver, TransceiverDriver, TxFraming,
};
use crate::errors::{DriverError, DriverResult};

#[derive(Debug)]
struct SimState {
    journal: Vec<String>,
    faults: Vec<(String, DriverError)>,
    panics: Vec<String>,
    releases: Vec<String>,
    clkpll_lock: u32,
    rf_pll_lock: u32,
    rf_programmed: bool,
    mcs_status: u32,
    rx_framer: u32,
    orx_framer: u32,
    deframer: u32,
    link_status: u32,
    lane_count: u8,
    calibration_script: VecDeque<CalibrationStatus>,
    running_mask: CalibrationMask,
    polled_mask: CalibrationMask,
    abort_error: Option<DriverError>,
    obs_rx_sources: Vec<ObsRxSource>,
    firmware_version: Option<FirmwareVersion>,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            journal: Vec::new(),
            faults: Vec::new(),
            panics: Vec::new(),
            releases: Vec::new(),
            clkpll_lock: 0x01,
            rf_pll_lock: 0x0F,
            rf_programmed: false,
            mcs_status: 0x0B,
            rx_framer: 0x3E,
            orx_framer: 0x3E,
            deframer: 0x28,
            link_status: 0x01,
            lane_count: 2,
            calibration_script: VecDeque::new(),
            running_mask: CalibrationMask::NONE,
            polled_mask: CalibrationMask::NONE,
            abort_error: None,
            obs_rx_sources: Vec::new(),
            firmware_version: Some(FirmwareVersion {
                major: 5,
                minor: 2,
                release: 2,
            }),
        }
    }
}

type Shared = Arc<Mutex<SimState>>;

/// Journals `entry` and applies any matching fault or panic.
fn call(shared: &Shared, entry: String) -> DriverResult<()> {
    let mut state = shared.lock();
    let should_panic = state.panics.iter().any(|prefix| entry.starts_with(prefix.as_str()));
    let fault = state
        .faults
        .iter()
        .find(|(prefix, _)| entry.starts_with(prefix.as_str()))
        .map(|(_, err)| err.clone());
    state.journal.push(entry.clone());
    drop(state);

    if should_panic {
        panic!("simulated panic in {entry}");
    }
    fault.map_or(Ok(()), Err)
}

/// Journals a release and records `name` as released when it succeeds.
fn release(shared: &Shared, entry: String, name: &str) -> DriverResult<()> {
    call(shared, entry)?;
    shared.lock().releases.push(name.to_string());
    Ok(())
}

/// A simulated board.
///
/// Every driver call is appended to a journal as `"<component>.<op> <args>"`,
/// for example `"synth.set_rate rx_clkgen 122880000"`. Faults are injected by
/// journal prefix; status registers default to the values of a healthy
/// board. Clones share state, so a test keeps one copy for inspection and
/// hands [`SimulatedBoard::board`] to the run.
#[derive(Debug, Clone, Default)]
pub struct SimulatedBoard {
    state: Shared,
}

impl SimulatedBoard {
    /// Creates a healthy board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the driver collaborators backed by this board.
    #[must_use]
    pub fn board(&self) -> Board {
        Board {
            platform: Box::new(SimPlatform(self.state.clone())),
            clock: Box::new(SimClock(self.state.clone())),
            synths: Box::new(SimSynthDriver(self.state.clone())),
            links: Box::new(SimLinkDriver(self.state.clone())),
            serdes: Box::new(SimSerdesDriver(self.state.clone())),
            transceiver: Box::new(SimTransceiverDriver(self.state.clone())),
            data_path: Box::new(SimDataPath(self.state.clone())),
        }
    }

    /// Fails every call whose journal entry starts with `prefix`.
    pub fn fail_on(&self, prefix: impl Into<String>, error: DriverError) {
        self.state.lock().faults.push((prefix.into(), error));
    }

    /// Panics inside every call whose journal entry starts with `prefix`.
    pub fn panic_on(&self, prefix: impl Into<String>) {
        self.state.lock().panics.push(prefix.into());
    }

    /// Sets the PLL lock status before and after RF programming.
    pub fn set_pll_lock(&self, before_rf: u32, after_rf: u32) {
        let mut state = self.state.lock();
        state.clkpll_lock = before_rf;
        state.rf_pll_lock = after_rf;
    }

    /// Sets the multichip sync status.
    pub fn set_mcs_status(&self, status: u32) {
        self.state.lock().mcs_status = status;
    }

    /// Sets the status reported by `framer`.
    pub fn set_framer_status(&self, framer: Framer, status: u32) {
        let mut state = self.state.lock();
        match framer {
            Framer::Rx => state.rx_framer = status,
            Framer::ObsRx => state.orx_framer = status,
        }
    }

    /// Sets the deframer status.
    pub fn set_deframer_status(&self, status: u32) {
        self.state.lock().deframer = status;
    }

    /// Sets the number of lanes every FPGA link core reports.
    pub fn set_lane_count(&self, lanes: u8) {
        self.state.lock().lane_count = lanes;
    }

    /// Makes the firmware version unreadable.
    pub fn hide_firmware_version(&self) {
        self.state.lock().firmware_version = None;
    }

    /// Queues calibration polls.
    ///
    /// Polls are answered from the queue in order; the last entry repeats.
    /// With an empty queue a poll reports the running mask completed.
    pub fn script_calibrations(&self, polls: impl IntoIterator<Item = CalibrationStatus>) {
        self.state.lock().calibration_script = polls.into_iter().collect();
    }

    /// Makes calibration aborts fail.
    pub fn fail_abort(&self, error: DriverError) {
        self.state.lock().abort_error = Some(error);
    }

    /// All journal entries in call order.
    #[must_use]
    pub fn journal(&self) -> Vec<String> {
        self.state.lock().journal.clone()
    }

    /// Journal entries starting with `prefix`.
    #[must_use]
    pub fn journal_matching(&self, prefix: &str) -> Vec<String> {
        self.state
            .lock()
            .journal
            .iter()
            .filter(|entry| entry.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Position of the first journal entry equal to `entry`.
    #[must_use]
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.state.lock().journal.iter().position(|e| e == entry)
    }

    /// Number of calibration aborts issued.
    #[must_use]
    pub fn abort_count(&self) -> usize {
        self.journal_matching("xcvr.abort_cals").len()
    }

    /// Number of SYSREF pulses requested.
    #[must_use]
    pub fn sysref_pulses(&self) -> usize {
        self.journal_matching("clock.sysref").len()
    }

    /// Observation sources selected, in order.
    #[must_use]
    pub fn obs_rx_sources(&self) -> Vec<ObsRxSource> {
        self.state.lock().obs_rx_sources.clone()
    }

    /// Resources released successfully, in release order.
    #[must_use]
    pub fn releases(&self) -> Vec<String> {
        self.state.lock().releases.clone()
    }
}

#[derive(Debug)]
struct SimPlatform(Shared);

impl Platform for SimPlatform {
    fn init(&mut self) -> DriverResult<Box<dyn PlatformSession>> {
        call(&self.0, "platform.init".into())?;
        Ok(Box::new(SimSession(self.0.clone())))
    }
}

#[derive(Debug)]
struct SimSession(Shared);

impl PlatformSession for SimSession {
    fn shutdown(&mut self) -> DriverResult<()> {
        release(&self.0, "platform.shutdown".into(), "platform")
    }
}

#[derive(Debug)]
struct SimClock(Shared);

impl ClockSource for SimClock {
    fn reset(&mut self) -> DriverResult<()> {
        call(&self.0, "clock.reset".into())
    }

    fn configure(&mut self, config: &ClockConfig) -> DriverResult<()> {
        call(&self.0, format!("clock.configure {}", config.device_clock_hz))
    }

    fn program(&mut self) -> DriverResult<()> {
        call(&self.0, "clock.program".into())
    }

    fn request_sysref(&mut self) -> DriverResult<()> {
        call(&self.0, "clock.sysref".into())
    }
}

#[derive(Debug)]
struct SimSynthDriver(Shared);

impl SynthDriver for SimSynthDriver {
    fn init(&mut self, params: &SynthParams) -> DriverResult<Box<dyn FrequencySynth>> {
        call(&self.0, format!("synth.init {}", params.name))?;
        Ok(Box::new(SimSynth {
            shared: self.0.clone(),
            name: params.name.clone(),
        }))
    }
}

#[derive(Debug)]
struct SimSynth {
    shared: Shared,
    name: String,
}

impl FrequencySynth for SimSynth {
    fn set_rate(&mut self, rate_hz: u64) -> DriverResult<()> {
        call(&self.shared, format!("synth.set_rate {} {rate_hz}", self.name))
    }

    fn enable(&mut self) -> DriverResult<()> {
        call(&self.shared, format!("synth.enable {}", self.name))
    }

    fn disable(&mut self) -> DriverResult<()> {
        call(&self.shared, format!("synth.disable {}", self.name))
    }

    fn remove(&mut self) -> DriverResult<()> {
        release(&self.shared, format!("synth.remove {}", self.name), &self.name)
    }
}

#[derive(Debug)]
struct SimLinkDriver(Shared);

impl SimLinkDriver {
    fn link(&self, name: &str) -> Box<dyn DigitalLink> {
        let lanes = self.0.lock().lane_count;
        Box::new(SimLink {
            shared: self.0.clone(),
            name: name.to_string(),
            lanes,
        })
    }
}

impl LinkDriver for SimLinkDriver {
    fn init_rx(&mut self, params: &LinkParams) -> DriverResult<Box<dyn DigitalLink>> {
        call(&self.0, format!("link.init_rx {}", params.name))?;
        Ok(self.link(&params.name))
    }

    fn init_tx(&mut self, params: &LinkParams, _framing: &TxFraming) -> DriverResult<Box<dyn DigitalLink>> {
        call(&self.0, format!("link.init_tx {}", params.name))?;
        Ok(self.link(&params.name))
    }
}

#[derive(Debug)]
struct SimLink {
    shared: Shared,
    name: String,
    lanes: u8,
}

impl DigitalLink for SimLink {
    fn enable_lane_clock(&mut self) -> DriverResult<()> {
        call(&self.shared, format!("link.lane_clock {}", self.name))
    }

    fn start_watchdog(&mut self) -> DriverResult<()> {
        call(&self.shared, format!("link.watchdog {}", self.name))
    }

    fn read_status(&mut self) -> DriverResult<u32> {
        call(&self.shared, format!("link.status {}", self.name))?;
        Ok(self.shared.lock().link_status)
    }

    fn lane_count(&self) -> u8 {
        self.lanes
    }

    fn read_lane_info(&mut self, lane: u8) -> DriverResult<LaneInfo> {
        call(&self.shared, format!("link.lane_info {} {lane}", self.name))?;
        Ok(LaneInfo {
            lane,
            status: 0x01,
            errors: 0,
        })
    }

    fn remove(&mut self) -> DriverResult<()> {
        release(&self.shared, format!("link.remove {}", self.name), &self.name)
    }
}

#[derive(Debug)]
struct SimSerdesDriver(Shared);

impl SerdesDriver for SimSerdesDriver {
    fn init(&mut self, params: &SerdesParams) -> DriverResult<Box<dyn SerdesLaneGroup>> {
        call(&self.0, format!("serdes.init {}", params.name))?;
        Ok(Box::new(SimLanes {
            shared: self.0.clone(),
            name: params.name.clone(),
        }))
    }
}

#[derive(Debug)]
struct SimLanes {
    shared: Shared,
    name: String,
}

impl SerdesLaneGroup for SimLanes {
    fn enable_clock(&mut self) -> DriverResult<()> {
        call(&self.shared, format!("serdes.clock {}", self.name))
    }

    fn remove(&mut self) -> DriverResult<()> {
        release(&self.shared, format!("serdes.remove {}", self.name), &self.name)
    }
}

#[derive(Debug)]
struct SimTransceiverDriver(Shared);

impl TransceiverDriver for SimTransceiverDriver {
    fn attach(&mut self) -> DriverResult<Box<dyn Transceiver>> {
        call(&self.0, "xcvr.attach".into())?;
        Ok(Box::new(SimTransceiver(self.0.clone())))
    }
}

#[derive(Debug)]
struct SimTransceiver(Shared);

impl Transceiver for SimTransceiver {
    fn reset(&mut self) -> DriverResult<()> {
        call(&self.0, "xcvr.reset".into())
    }

    fn initialize(&mut self) -> DriverResult<()> {
        call(&self.0, "xcvr.initialize".into())
    }

    fn check_pll_lock(&mut self) -> DriverResult<u32> {
        call(&self.0, "xcvr.pll_lock".into())?;
        let state = self.0.lock();
        Ok(if state.rf_programmed {
            state.rf_pll_lock
        } else {
            state.clkpll_lock
        })
    }

    fn enable_multichip_sync(&mut self, enable: bool) -> DriverResult<u32> {
        call(&self.0, format!("xcvr.mcs {enable}"))?;
        Ok(self.0.lock().mcs_status)
    }

    fn init_firmware_engine(&mut self) -> DriverResult<()> {
        call(&self.0, "xcvr.firmware_engine".into())
    }

    fn load_firmware(&mut self, image: &[u8]) -> DriverResult<()> {
        call(&self.0, format!("xcvr.load_firmware {}", image.len()))
    }

    fn firmware_version(&mut self) -> DriverResult<FirmwareVersion> {
        call(&self.0, "xcvr.firmware_version".into())?;
        self.0
            .lock()
            .firmware_version
            .ok_or_else(|| DriverError::hardware(-1, "version register unreadable"))
    }

    fn set_rf_frequency(&mut self, pll: RfPll, frequency_hz: u64) -> DriverResult<()> {
        call(&self.0, format!("xcvr.rf_frequency {pll} {frequency_hz}"))?;
        self.0.lock().rf_programmed = true;
        Ok(())
    }

    fn set_control_pin(&mut self, setting: &ControlPinSetting) -> DriverResult<()> {
        call(&self.0, format!("xcvr.control_pin {}", setting.channel))
    }

    fn setup_gpio(&mut self) -> DriverResult<()> {
        call(&self.0, "xcvr.gpio".into())
    }

    fn set_manual_gain(&mut self, target: GainTarget, index: u8) -> DriverResult<()> {
        call(&self.0, format!("xcvr.gain {target} {index}"))
    }

    fn set_attenuation(&mut self, channel: TxChannel, milli_db: u16) -> DriverResult<()> {
        call(&self.0, format!("xcvr.attenuation {channel} {milli_db}"))
    }

    fn run_calibrations(&mut self, mask: CalibrationMask) -> DriverResult<()> {
        call(&self.0, format!("xcvr.run_cals {:#x}", mask.bits()))?;
        let mut state = self.0.lock();
        state.running_mask = mask;
        state.polled_mask = CalibrationMask::NONE;
        Ok(())
    }

    fn poll_calibrations(&mut self) -> DriverResult<CalibrationStatus> {
        call(&self.0, "xcvr.poll_cals".into())?;
        let mut state = self.0.lock();
        let status = if state.calibration_script.len() > 1 {
            state.calibration_script.pop_front()
        } else {
            state.calibration_script.front().copied()
        };
        let status = status.unwrap_or(CalibrationStatus {
            in_progress: false,
            completed: state.running_mask,
            error_flag: 0,
            error_code: 0,
        });
        state.polled_mask = status.completed;
        Ok(status)
    }

    fn abort_calibrations(&mut self) -> DriverResult<CalibrationMask> {
        call(&self.0, "xcvr.abort_cals".into())?;
        let state = self.0.lock();
        match &state.abort_error {
            Some(err) => Err(err.clone()),
            None => Ok(state.polled_mask),
        }
    }

    fn enable_sysref_to_framer(&mut self, framer: Framer, enable: bool) -> DriverResult<()> {
        call(&self.0, format!("xcvr.framer_sysref {framer} {enable}"))
    }

    fn enable_sysref_to_deframer(&mut self, enable: bool) -> DriverResult<()> {
        call(&self.0, format!("xcvr.deframer_sysref {enable}"))
    }

    fn reset_deframer(&mut self) -> DriverResult<()> {
        call(&self.0, "xcvr.reset_deframer".into())
    }

    fn read_framer_status(&mut self, framer: Framer) -> DriverResult<u32> {
        call(&self.0, format!("xcvr.framer_status {framer}"))?;
        let state = self.0.lock();
        Ok(match framer {
            Framer::Rx => state.rx_framer,
            Framer::ObsRx => state.orx_framer,
        })
    }

    fn read_deframer_status(&mut self) -> DriverResult<u32> {
        call(&self.0, "xcvr.deframer_status".into())?;
        Ok(self.0.lock().deframer)
    }

    fn enable_tracking_calibrations(&mut self, mask: CalibrationMask) -> DriverResult<()> {
        call(&self.0, format!("xcvr.tracking {:#x}", mask.bits()))
    }

    fn radio_on(&mut self) -> DriverResult<()> {
        call(&self.0, "xcvr.radio_on".into())
    }

    fn set_obs_rx_source(&mut self, source: ObsRxSource) -> DriverResult<()> {
        call(&self.0, format!("xcvr.obs_rx {source}"))?;
        self.0.lock().obs_rx_sources.push(source);
        Ok(())
    }

    fn shutdown(&mut self) -> DriverResult<()> {
        release(&self.0, "xcvr.shutdown".into(), "transceiver")
    }
}

#[derive(Debug)]
struct SimDataPath(Shared);

impl DataPathDriver for SimDataPath {
    fn init_dac(&mut self, params: &ConverterParams) -> DriverResult<Box<dyn DataConverter>> {
        call(&self.0, format!("dac.init {}", params.name))?;
        Ok(Box::new(SimConverter {
            shared: self.0.clone(),
            component: "dac",
            name: params.name.clone(),
        }))
    }

    fn init_adc(&mut self, params: &ConverterParams) -> DriverResult<Box<dyn DataConverter>> {
        call(&self.0, format!("adc.init {}", params.name))?;
        Ok(Box::new(SimConverter {
            shared: self.0.clone(),
            component: "adc",
            name: params.name.clone(),
        }))
    }

    fn init_dma(&mut self, params: &DmaParams) -> DriverResult<Box<dyn DmaChannel>> {
        call(&self.0, format!("dma.init {}", params.name))?;
        Ok(Box::new(SimDma {
            shared: self.0.clone(),
            name: params.name.clone(),
        }))
    }
}

#[derive(Debug)]
struct SimConverter {
    shared: Shared,
    component: &'static str,
    name: String,
}

impl DataConverter for SimConverter {
    fn remove(&mut self) -> DriverResult<()> {
        release(
            &self.shared,
            format!("{}.remove {}", self.component, self.name),
            &self.name,
        )
    }
}

#[derive(Debug)]
struct SimDma {
    shared: Shared,
    name: String,
}

impl DmaChannel for SimDma {
    fn transfer(&mut self, address: u64, length: u64) -> DriverResult<()> {
        call(&self.shared, format!("dma.transfer {} {address:#x} {length}", self.name))
    }

    fn invalidate_cache(&mut self, address: u64, length: u64) -> DriverResult<()> {
        call(&self.shared, format!("dma.invalidate {} {address:#x} {length}", self.name))
    }

    fn remove(&mut self) -> DriverResult<()> {
        release(&self.shared, format!("dma.remove {}", self.name), &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_journal_and_fault_injection() {
        let sim = SimulatedBoard::new();
        sim.fail_on("synth.set_rate tx_clkgen", DriverError::hardware(-3, "no lock"));
        let mut board = sim.board();

        let mut rx = board
            .synths
            .init(&SynthParams {
                name: "rx_clkgen".into(),
                base_address: 0,
                parent_rate_hz: 100_000_000,
            })
            .unwrap();
        rx.set_rate(122_880_000).unwrap();

        let mut tx = board
            .synths
            .init(&SynthParams {
                name: "tx_clkgen".into(),
                base_address: 0,
                parent_rate_hz: 100_000_000,
            })
            .unwrap();
        let err = tx.set_rate(122_880_000).unwrap_err();
        assert_eq!(err.code(), Some(-3));

        assert_eq!(
            sim.journal(),
            vec![
                "synth.init rx_clkgen",
                "synth.set_rate rx_clkgen 122880000",
                "synth.init tx_clkgen",
                "synth.set_rate tx_clkgen 122880000",
            ]
        );
    }

    #[test]
    fn test_pll_lock_follows_rf_programming() {
        let sim = SimulatedBoard::new();
        sim.set_pll_lock(0x01, 0x07);
        let mut device = sim.board().transceiver.attach().unwrap();

        assert_eq!(device.check_pll_lock().unwrap(), 0x01);
        device.set_rf_frequency(RfPll::Rx, 2_500_000_000).unwrap();
        assert_eq!(device.check_pll_lock().unwrap(), 0x07);
    }

    #[test]
    fn test_calibration_script_repeats_last_poll() {
        let sim = SimulatedBoard::new();
        sim.script_calibrations([
            CalibrationStatus {
                in_progress: true,
                ..CalibrationStatus::default()
            },
            CalibrationStatus {
                in_progress: false,
                completed: CalibrationMask::DC_OFFSET,
                error_flag: 1,
                error_code: 0,
            },
        ]);
        let mut device = sim.board().transceiver.attach().unwrap();

        assert!(device.poll_calibrations().unwrap().in_progress);
        assert!(device.poll_calibrations().unwrap().has_error());
        assert!(device.poll_calibrations().unwrap().has_error());
    }

    #[test]
    fn test_unscripted_poll_completes_running_mask() {
        let sim = SimulatedBoard::new();
        let mut device = sim.board().transceiver.attach().unwrap();
        device.run_calibrations(CalibrationMask::default_init()).unwrap();

        let status = device.poll_calibrations().unwrap();
        assert!(!status.in_progress);
        assert_eq!(status.completed, CalibrationMask::default_init());
    }

    #[test]
    fn test_releases_recorded_only_on_success() {
        let sim = SimulatedBoard::new();
        sim.fail_on("serdes.remove", DriverError::transport("bus error"));
        let mut board = sim.board();

        let mut session = board.platform.init().unwrap();
        let mut lanes = board
            .serdes
            .init(&SerdesParams {
                name: "rx_xcvr".into(),
                link: crate::core::LinkId::Rx,
                tx: false,
                lane_count: 2,
                lane_rate_khz: 4_915_200,
                ref_rate_khz: 122_880,
                variant: crate::drivers::SerdesVariant::Adxcfg {
                    lane_bases: vec![],
                    atx_pll_base: None,
                },
            })
            .unwrap();

        assert!(lanes.remove().is_err());
        session.shutdown().unwrap();
        assert_eq!(sim.releases(), vec!["platform"]);
    }

    #[test]
    #[should_panic(expected = "simulated panic")]
    fn test_panic_injection() {
        let sim = SimulatedBoard::new();
        sim.panic_on("clock.reset");
        let _ = sim.board().clock.reset();
    }
}
