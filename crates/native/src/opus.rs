//! libopus-Bindings
//!
//! Kapselt die rohen Zeiger aus `audiopus_sys` in besitzende Typen. Der
//! native Handle wird genau einmal freigegeben, naemlich wenn der
//! besitzende Wert gedroppt wird. Explizites Freigeben erfolgt ueber
//! `Option::take` beim Eigentuemer.

use std::ffi::CStr;
use std::os::raw::c_int;
use std::ptr::{self, NonNull};

use audiopus_sys as sys;
use tracing::trace;
use voxwire_core::{VoxError, VoxResult};

// ---------------------------------------------------------------------------
// Native Konstanten (opus_defines.h)
// ---------------------------------------------------------------------------

const OPUS_OK: c_int = 0;
const OPUS_ALLOC_FAIL: c_int = -7;

const OPUS_SET_BITRATE_REQUEST: c_int = 4002;
const OPUS_SET_INBAND_FEC_REQUEST: c_int = 4012;
const OPUS_SET_PACKET_LOSS_PERC_REQUEST: c_int = 4014;
const OPUS_SET_SIGNAL_REQUEST: c_int = 4024;
const OPUS_GET_LAST_PACKET_DURATION_REQUEST: c_int = 4039;

/// Opus-Anwendungsmodus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Application {
    Voip = 2048,
    Audio = 2049,
    RestrictedLowDelay = 2051,
}

/// Signal-Hinweis fuer den Encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Signal {
    Auto = -1000,
    Voice = 3001,
    Music = 3002,
}

/// Encoder-Optionen, die ueber `opus_encoder_ctl` gesetzt werden
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderCtl {
    /// Ziel-Bitrate in Bit/s
    Bitrate(i32),
    /// In-Band Forward Error Correction
    InbandFec(bool),
    /// Erwarteter Paketverlust in Prozent (0–100)
    PacketLossPercent(u8),
    Signal(Signal),
}

impl EncoderCtl {
    fn request(self) -> (c_int, c_int) {
        match self {
            Self::Bitrate(bps) => (OPUS_SET_BITRATE_REQUEST, bps),
            Self::InbandFec(an) => (OPUS_SET_INBAND_FEC_REQUEST, c_int::from(an)),
            Self::PacketLossPercent(p) => (OPUS_SET_PACKET_LOSS_PERC_REQUEST, c_int::from(p)),
            Self::Signal(s) => (OPUS_SET_SIGNAL_REQUEST, s as c_int),
        }
    }
}

/// Liefert die Fehlerbeschreibung von libopus fuer einen Statuscode
pub fn strerror(code: i32) -> String {
    // SAFETY: opus_strerror liefert fuer jeden Code einen statischen C-String.
    let text = unsafe { sys::opus_strerror(code) };
    if text.is_null() {
        return format!("unbekannter Opus-Fehler {code}");
    }
    // SAFETY: nicht-null, nullterminiert, statische Lebensdauer.
    unsafe { CStr::from_ptr(text) }
        .to_string_lossy()
        .into_owned()
}

fn codec_fehler(operation: &'static str, code: c_int) -> VoxError {
    VoxError::Codec {
        operation,
        code,
        nachricht: strerror(code),
    }
}

fn pruefe_kanaele(channels: usize) -> VoxResult<()> {
    if channels == 1 || channels == 2 {
        Ok(())
    } else {
        Err(VoxError::Argument(format!(
            "Opus unterstuetzt 1 oder 2 Kanaele, nicht {channels}"
        )))
    }
}

// ---------------------------------------------------------------------------
// RawEncoder
// ---------------------------------------------------------------------------

/// Besitzender Handle auf einen nativen `OpusEncoder`
#[derive(Debug)]
pub struct RawEncoder {
    ptr: NonNull<sys::OpusEncoder>,
    channels: usize,
}

// SAFETY: Der Encoder-Zustand ist nicht an einen Thread gebunden; alle
// Zugriffe laufen ueber `&mut self` und sind damit exklusiv.
unsafe impl Send for RawEncoder {}
// SAFETY: Ueber `&self` ist nur `channels()` erreichbar, der native Zustand
// wird dabei nicht beruehrt.
unsafe impl Sync for RawEncoder {}

impl RawEncoder {
    /// Erstellt einen Encoder (`opus_encoder_create`)
    pub fn create(
        sample_rate: u32,
        channels: usize,
        application: Application,
    ) -> VoxResult<Self> {
        pruefe_kanaele(channels)?;
        let mut error: c_int = OPUS_OK;
        // SAFETY: `error` ist ein gueltiger Ausgabezeiger fuer die Dauer des Aufrufs.
        let ptr = unsafe {
            sys::opus_encoder_create(
                sample_rate as i32,
                channels as c_int,
                application as c_int,
                &mut error,
            )
        };
        if error != OPUS_OK {
            return Err(codec_fehler("opus_encoder_create", error));
        }
        let ptr = NonNull::new(ptr)
            .ok_or_else(|| codec_fehler("opus_encoder_create", OPUS_ALLOC_FAIL))?;
        trace!(sample_rate, channels, "Nativer Opus-Encoder erstellt");
        Ok(Self { ptr, channels })
    }

    /// Setzt eine Encoder-Option
    pub fn set(&mut self, ctl: EncoderCtl) -> VoxResult<()> {
        let (request, wert) = ctl.request();
        // SAFETY: gueltiger Handle, SET-Requests erwarten genau ein opus_int32.
        let rc = unsafe { sys::opus_encoder_ctl(self.ptr.as_ptr(), request, wert) };
        if rc < OPUS_OK {
            return Err(codec_fehler("opus_encoder_ctl", rc));
        }
        Ok(())
    }

    /// Kodiert `frame_size` Samples pro Kanal in `target`.
    ///
    /// Gibt die Anzahl geschriebener Bytes zurueck.
    pub fn encode(
        &mut self,
        pcm: &[i16],
        frame_size: usize,
        target: &mut [u8],
    ) -> VoxResult<usize> {
        let benoetigt = frame_size * self.channels;
        if pcm.len() != benoetigt {
            return Err(VoxError::puffer("Opus-Eingabe (Samples)", benoetigt, pcm.len()));
        }
        if target.is_empty() {
            return Err(VoxError::Argument("Opus-Zielpuffer ist leer".into()));
        }
        // SAFETY: pcm enthaelt frame_size * channels Samples, target ist
        // target.len() Bytes gross; beide leben fuer die Dauer des Aufrufs.
        let rc = unsafe {
            sys::opus_encode(
                self.ptr.as_ptr(),
                pcm.as_ptr(),
                frame_size as c_int,
                target.as_mut_ptr(),
                target.len().min(i32::MAX as usize) as i32,
            )
        };
        if rc < OPUS_OK {
            return Err(codec_fehler("opus_encode", rc));
        }
        Ok(rc as usize)
    }

    pub fn channels(&self) -> usize {
        self.channels
    }
}

impl Drop for RawEncoder {
    fn drop(&mut self) {
        // SAFETY: der Zeiger stammt aus opus_encoder_create und wird nur hier freigegeben.
        unsafe { sys::opus_encoder_destroy(self.ptr.as_ptr()) };
        trace!("Nativer Opus-Encoder freigegeben");
    }
}

// ---------------------------------------------------------------------------
// RawDecoder
// ---------------------------------------------------------------------------

/// Besitzender Handle auf einen nativen `OpusDecoder`
#[derive(Debug)]
pub struct RawDecoder {
    ptr: NonNull<sys::OpusDecoder>,
    channels: usize,
}

// SAFETY: siehe RawEncoder.
unsafe impl Send for RawDecoder {}

impl RawDecoder {
    /// Erstellt einen Decoder (`opus_decoder_create`)
    pub fn create(sample_rate: u32, channels: usize) -> VoxResult<Self> {
        pruefe_kanaele(channels)?;
        let mut error: c_int = OPUS_OK;
        // SAFETY: `error` ist ein gueltiger Ausgabezeiger.
        let ptr = unsafe {
            sys::opus_decoder_create(sample_rate as i32, channels as c_int, &mut error)
        };
        if error != OPUS_OK {
            return Err(codec_fehler("opus_decoder_create", error));
        }
        let ptr = NonNull::new(ptr)
            .ok_or_else(|| codec_fehler("opus_decoder_create", OPUS_ALLOC_FAIL))?;
        trace!(sample_rate, channels, "Nativer Opus-Decoder erstellt");
        Ok(Self { ptr, channels })
    }

    /// Dekodiert ein Paket. `None` aktiviert die Verlustverdeckung.
    ///
    /// `target` muss Platz fuer `frame_size * channels` Samples haben.
    /// Gibt die Anzahl dekodierter Samples pro Kanal zurueck.
    pub fn decode(
        &mut self,
        packet: Option<&[u8]>,
        target: &mut [i16],
        frame_size: usize,
        fec: bool,
    ) -> VoxResult<usize> {
        if frame_size == 0 {
            return Err(VoxError::Argument("Frame-Groesse 0 ist ungueltig".into()));
        }
        let benoetigt = frame_size * self.channels;
        if target.len() < benoetigt {
            return Err(VoxError::puffer("Opus-Ausgabe (Samples)", benoetigt, target.len()));
        }
        let (data, len) = match packet {
            Some(p) if p.is_empty() => {
                return Err(VoxError::Argument("Leeres Opus-Paket".into()));
            }
            Some(p) => (p.as_ptr(), p.len().min(i32::MAX as usize) as i32),
            None => (ptr::null(), 0),
        };
        // SAFETY: data ist null (PLC) oder zeigt auf len gueltige Bytes;
        // target bietet Platz fuer frame_size * channels Samples.
        let rc = unsafe {
            sys::opus_decode(
                self.ptr.as_ptr(),
                data,
                len,
                target.as_mut_ptr(),
                frame_size as c_int,
                c_int::from(fec),
            )
        };
        if rc < OPUS_OK {
            return Err(codec_fehler("opus_decode", rc));
        }
        Ok(rc as usize)
    }

    /// Dauer des zuletzt dekodierten oder verdeckten Pakets in Samples pro Kanal
    pub fn last_packet_duration(&mut self) -> VoxResult<usize> {
        let mut dauer: i32 = 0;
        // SAFETY: GET-Request erwartet einen opus_int32-Zeiger, der fuer den Aufruf lebt.
        let rc = unsafe {
            sys::opus_decoder_ctl(
                self.ptr.as_ptr(),
                OPUS_GET_LAST_PACKET_DURATION_REQUEST,
                &mut dauer as *mut i32,
            )
        };
        if rc < OPUS_OK {
            return Err(codec_fehler("opus_decoder_ctl", rc));
        }
        Ok(dauer.max(0) as usize)
    }

    pub fn channels(&self) -> usize {
        self.channels
    }
}

impl Drop for RawDecoder {
    fn drop(&mut self) {
        // SAFETY: der Zeiger stammt aus opus_decoder_create und wird nur hier freigegeben.
        unsafe { sys::opus_decoder_destroy(self.ptr.as_ptr()) };
        trace!("Nativer Opus-Decoder freigegeben");
    }
}

// ---------------------------------------------------------------------------
// Paket-Metadaten
// ---------------------------------------------------------------------------

/// Metadaten eines Opus-Pakets (aus dem TOC-Byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketInfo {
    pub channels: usize,
    pub frames: usize,
    pub samples_per_frame: usize,
}

impl PacketInfo {
    /// Liest Kanalzahl, Frame-Anzahl und Samples pro Frame aus einem Paket
    pub fn read(packet: &[u8], sample_rate: u32) -> VoxResult<Self> {
        if packet.is_empty() {
            return Err(VoxError::Argument("Leeres Opus-Paket".into()));
        }
        let len = packet.len().min(i32::MAX as usize) as i32;
        // SAFETY: packet ist nicht leer; alle drei Funktionen lesen hoechstens len Bytes.
        let (channels, frames, samples_per_frame) = unsafe {
            (
                sys::opus_packet_get_nb_channels(packet.as_ptr()),
                sys::opus_packet_get_nb_frames(packet.as_ptr(), len),
                sys::opus_packet_get_samples_per_frame(packet.as_ptr(), sample_rate as i32),
            )
        };
        if channels < OPUS_OK {
            return Err(codec_fehler("opus_packet_get_nb_channels", channels));
        }
        if frames < OPUS_OK {
            return Err(codec_fehler("opus_packet_get_nb_frames", frames));
        }
        if samples_per_frame < OPUS_OK {
            return Err(codec_fehler("opus_packet_get_samples_per_frame", samples_per_frame));
        }
        Ok(Self {
            channels: channels as usize,
            frames: frames as usize,
            samples_per_frame: samples_per_frame as usize,
        })
    }

    /// Gesamtzahl Samples pro Kanal im Paket
    pub fn frame_size(&self) -> usize {
        self.frames * self.samples_per_frame
    }
}
