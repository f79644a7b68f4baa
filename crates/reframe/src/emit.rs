//! Output units and the metadata attached to them.

use bytes::Bytes;

use crate::cache::StreamInfo;
use crate::format::FormatDescriptor;

bitflags::bitflags! {
    /// Flags carried by an [`OutputUnit`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct OutputFlags: u8 {
        /// First unit after a discontinuity.
        const DISCONT = 1 << 0;
        /// The unit carries stream headers.
        const HEADER = 1 << 1;
        /// The unit cannot be decoded on its own.
        const DELTA_UNIT = 1 << 2;
        /// The unit closes an access unit or temporal unit.
        const MARKER = 1 << 3;
        /// The unit is decoded but never displayed.
        const DECODE_ONLY = 1 << 4;
        /// The picture is a field or field pair.
        const INTERLACED = 1 << 5;
    }
}

/// Timing of a unit in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timestamps {
    /// Presentation time.
    pub pts: Option<u64>,
    /// Decode time.
    pub dts: Option<u64>,
    /// Duration.
    pub duration: Option<u64>,
}

impl Timestamps {
    /// No timing known.
    pub const NONE: Self = Self {
        pts: None,
        dts: None,
        duration: None,
    };

    /// Presentation and decode time set to `ts`.
    pub const fn at(ts: u64) -> Self {
        Self {
            pts: Some(ts),
            dts: Some(ts),
            duration: None,
        }
    }
}

/// The format of the output together with the stream description.
#[derive(Debug, Clone, PartialEq)]
pub struct Caps {
    /// Negotiated output format.
    pub format: FormatDescriptor,
    /// Derived stream description.
    pub info: StreamInfo,
}

/// A finished unit handed downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputUnit {
    /// The repackaged bytes.
    pub data: Bytes,
    /// Timing.
    pub timestamps: Timestamps,
    /// Flags.
    pub flags: OutputFlags,
    /// Set when the caps changed since the previous unit.
    pub caps: Option<Caps>,
}

impl OutputUnit {
    /// The unit can start decoding.
    pub const fn is_keyframe(&self) -> bool {
        !self.flags.contains(OutputFlags::DELTA_UNIT)
    }
}

/// Attaches the sticky discontinuity flag and caps changes to output units.
#[derive(Debug, Clone)]
pub(crate) struct Emitter {
    discont: bool,
    last_caps: Option<Caps>,
}

impl Default for Emitter {
    fn default() -> Self {
        Self {
            discont: true,
            last_caps: None,
        }
    }
}

impl Emitter {
    /// The next unit gets [`OutputFlags::DISCONT`].
    pub fn mark_discont(&mut self) {
        self.discont = true;
    }

    /// Forces the caps onto the next unit.
    pub fn invalidate_caps(&mut self) {
        self.last_caps = None;
    }

    pub fn emit(
        &mut self,
        data: Bytes,
        timestamps: Timestamps,
        mut flags: OutputFlags,
        format: &FormatDescriptor,
        info: &StreamInfo,
    ) -> OutputUnit {
        if std::mem::take(&mut self.discont) {
            flags |= OutputFlags::DISCONT;
        }

        let caps = Caps {
            format: *format,
            info: info.clone(),
        };
        let caps = if self.last_caps.as_ref() != Some(&caps) {
            tracing::debug!(format = %caps.format, width = caps.info.width, height = caps.info.height, "caps changed");
            self.last_caps = Some(caps.clone());
            Some(caps)
        } else {
            None
        };

        tracing::trace!(size = data.len(), ?flags, pts = ?timestamps.pts, "emitting unit");

        OutputUnit {
            data,
            timestamps,
            flags,
            caps,
        }
    }
}
