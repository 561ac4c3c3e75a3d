//! Owned handles to live hardware instances.

use crate::core::ResourceKind;
use crate::drivers::{
    DataConverter, DigitalLink, DmaChannel, FrequencySynth, PlatformSession, SerdesLaneGroup,
    Transceiver,
};
use crate::errors::DriverResult;
use std::fmt;

/// The driver instance owned by a handle.
pub enum DriverContext {
    /// Open platform transport.
    Platform(Box<dyn PlatformSession>),
    /// Device-clock synthesizer.
    Synth(Box<dyn FrequencySynth>),
    /// Link-layer core.
    Link(Box<dyn DigitalLink>),
    /// SerDes lane group.
    Serdes(Box<dyn SerdesLaneGroup>),
    /// Transceiver device.
    Transceiver(Box<dyn Transceiver>),
    /// DAC or ADC core.
    Converter(Box<dyn DataConverter>),
    /// DMA channel.
    Dma(Box<dyn DmaChannel>),
}

impl DriverContext {
    fn variant_name(&self) -> &'static str {
        match self {
            Self::Platform(_) => "platform",
            Self::Synth(_) => "synth",
            Self::Link(_) => "link",
            Self::Serdes(_) => "serdes",
            Self::Transceiver(_) => "transceiver",
            Self::Converter(_) => "converter",
            Self::Dma(_) => "dma",
        }
    }
}

/// One live hardware subsystem instance.
///
/// The handle exclusively owns its driver instance. [`release`](Self::release)
/// consumes the handle, so an instance can be released at most once.
pub struct ResourceHandle {
    name: String,
    kind: ResourceKind,
    context: DriverContext,
}

impl ResourceHandle {
    /// Wraps an open platform transport.
    #[must_use]
    pub fn platform(name: impl Into<String>, session: Box<dyn PlatformSession>) -> Self {
        Self::new(name, ResourceKind::Platform, DriverContext::Platform(session))
    }

    /// Wraps a device-clock synthesizer.
    #[must_use]
    pub fn synth(name: impl Into<String>, synth: Box<dyn FrequencySynth>) -> Self {
        Self::new(name, ResourceKind::ClockPll, DriverContext::Synth(synth))
    }

    /// Wraps a receive link core.
    #[must_use]
    pub fn link_rx(name: impl Into<String>, link: Box<dyn DigitalLink>) -> Self {
        Self::new(name, ResourceKind::LinkRx, DriverContext::Link(link))
    }

    /// Wraps a transmit link core.
    #[must_use]
    pub fn link_tx(name: impl Into<String>, link: Box<dyn DigitalLink>) -> Self {
        Self::new(name, ResourceKind::LinkTx, DriverContext::Link(link))
    }

    /// Wraps a SerDes lane group.
    #[must_use]
    pub fn serdes(name: impl Into<String>, lanes: Box<dyn SerdesLaneGroup>) -> Self {
        Self::new(name, ResourceKind::SerdesLaneGroup, DriverContext::Serdes(lanes))
    }

    /// Wraps the transceiver device.
    #[must_use]
    pub fn transceiver(name: impl Into<String>, device: Box<dyn Transceiver>) -> Self {
        Self::new(name, ResourceKind::TransceiverDevice, DriverContext::Transceiver(device))
    }

    /// Wraps a DAC or ADC core.
    #[must_use]
    pub fn converter(name: impl Into<String>, converter: Box<dyn DataConverter>) -> Self {
        Self::new(name, ResourceKind::DataConverter, DriverContext::Converter(converter))
    }

    /// Wraps a DMA channel.
    #[must_use]
    pub fn dma(name: impl Into<String>, channel: Box<dyn DmaChannel>) -> Self {
        Self::new(name, ResourceKind::DmaChannel, DriverContext::Dma(channel))
    }

    fn new(name: impl Into<String>, kind: ResourceKind, context: DriverContext) -> Self {
        Self {
            name: name.into(),
            kind,
            context,
        }
    }

    /// Symbolic name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Subsystem kind.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// The synthesizer, if this handle owns one.
    pub fn as_synth(&mut self) -> Option<&mut dyn FrequencySynth> {
        match &mut self.context {
            DriverContext::Synth(synth) => Some(synth.as_mut()),
            _ => None,
        }
    }

    /// The link core, if this handle owns one.
    pub fn as_link(&mut self) -> Option<&mut dyn DigitalLink> {
        match &mut self.context {
            DriverContext::Link(link) => Some(link.as_mut()),
            _ => None,
        }
    }

    /// The lane group, if this handle owns one.
    pub fn as_serdes(&mut self) -> Option<&mut dyn SerdesLaneGroup> {
        match &mut self.context {
            DriverContext::Serdes(lanes) => Some(lanes.as_mut()),
            _ => None,
        }
    }

    /// The transceiver, if this handle owns it.
    pub fn as_transceiver(&mut self) -> Option<&mut dyn Transceiver> {
        match &mut self.context {
            DriverContext::Transceiver(device) => Some(device.as_mut()),
            _ => None,
        }
    }

    /// The DMA channel, if this handle owns one.
    pub fn as_dma(&mut self) -> Option<&mut dyn DmaChannel> {
        match &mut self.context {
            DriverContext::Dma(channel) => Some(channel.as_mut()),
            _ => None,
        }
    }

    /// Invokes the instance's release operation.
    pub fn release(mut self) -> DriverResult<()> {
        match &mut self.context {
            DriverContext::Platform(session) => session.shutdown(),
            DriverContext::Synth(synth) => synth.remove(),
            DriverContext::Link(link) => link.remove(),
            DriverContext::Serdes(lanes) => lanes.remove(),
            DriverContext::Transceiver(device) => device.shutdown(),
            DriverContext::Converter(converter) => converter.remove(),
            DriverContext::Dma(channel) => channel.remove(),
        }
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("context", &self.context.variant_name())
            .finish()
    }
}
