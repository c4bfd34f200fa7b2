// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Modbus RTU master for the fan inverters on the RS-485 bus.
//!
//! Only "write single holding register" (function 0x06) is needed. A write is a blocking
//! request/response transaction:
//!
//! 1. drive the transceiver DE pin high, send the 8-byte request, wait for the shifter to drain,
//!    release DE;
//! 2. collect the response until it is complete or the response timeout expires.
//!
//! A successful response echoes the request. An exception response sets bit 7 of the function
//! code and carries a one-byte exception code.
//!
//! RTU delimits frames by line silence, so consecutive transactions are separated by at least
//! `frame_gap_ms` of idle time (3.5 characters, 4 ms at 9600 baud).

use embedded_hal::digital::v2::OutputPin;
use embedded_hal::serial;
use nb::block;

use crate::drivers::Fieldbus;
use crate::time::{elapsed_ms, Clock, Millis};

/// Function code: write single holding register.
pub const FC_WRITE_SINGLE_REGISTER: u8 = 0x06;

/// Bit set in the function code of an exception response.
const EXCEPTION_FLAG: u8 = 0x80;

/// Request and echo length for function 0x06.
const WRITE_FRAME_LEN: usize = 8;

/// Exception response length.
const EXCEPTION_FRAME_LEN: usize = 5;

/// Upper bound on bytes discarded before a request.
const RX_DRAIN_LIMIT: usize = 64;

/// Default inter-frame silence.
pub const DEFAULT_FRAME_GAP_MS: u32 = 4;

/// Error type for `ModbusRtu` operations, generic over the UART receive error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Error<E> {
    /// UART transmit failure.
    Tx,
    /// Receive-side UART error (overrun, framing, noise).
    Rx(E),
    /// Could not drive the RS-485 direction pin.
    DirectionPin,
    /// No complete response within the response timeout.
    Timeout,
    /// Response CRC did not match.
    Crc,
    /// Device answered with an exception code.
    Exception(u8),
    /// Response from another address, with another function code, or not echoing the request.
    UnexpectedResponse,
}

/// CRC-16/MODBUS (poly 0xA001 reflected, init 0xFFFF).
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= byte as u16;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

/// Build a "write single register" request. The CRC goes out low byte first.
pub fn write_register_frame(device: u8, register: u16, value: u16) -> [u8; WRITE_FRAME_LEN] {
    let mut frame = [0u8; WRITE_FRAME_LEN];
    frame[0] = device;
    frame[1] = FC_WRITE_SINGLE_REGISTER;
    frame[2..4].copy_from_slice(&register.to_be_bytes());
    frame[4..6].copy_from_slice(&value.to_be_bytes());
    let crc = crc16(&frame[..6]);
    frame[6..8].copy_from_slice(&crc.to_le_bytes());
    frame
}

fn crc_ok(frame: &[u8]) -> bool {
    let (body, tail) = frame.split_at(frame.len() - 2);
    crc16(body).to_le_bytes() == [tail[0], tail[1]]
}

/// Validate a complete response to `request`.
fn check_response<E>(request: &[u8; WRITE_FRAME_LEN], response: &[u8]) -> Result<(), Error<E>> {
    if !crc_ok(response) {
        return Err(Error::Crc);
    }
    if response[0] != request[0] {
        return Err(Error::UnexpectedResponse);
    }
    if response[1] == request[1] | EXCEPTION_FLAG {
        return Err(Error::Exception(response[2]));
    }
    if response != &request[..] {
        return Err(Error::UnexpectedResponse);
    }
    Ok(())
}

/// Modbus RTU master over a half-duplex RS-485 transceiver.
///
/// - `TX`/`RX` are the UART halves.
/// - `DE` is the transceiver driver-enable pin (high = transmit).
/// - `C` provides the millisecond time base for the response timeout.
pub struct ModbusRtu<TX, RX, DE, C> {
    tx: TX,
    rx: RX,
    de: DE,
    clock: C,
    timeout_ms: u32,
    frame_gap_ms: u32,
    /// When the previous transaction ended, on either side of the line.
    last_frame_end: Option<Millis>,
}

impl<TX, RX, DE, C, E> ModbusRtu<TX, RX, DE, C>
where
    TX: serial::Write<u8>,
    RX: serial::Read<u8, Error = E>,
    DE: OutputPin,
    C: Clock,
{
    pub fn new(tx: TX, rx: RX, de: DE, clock: C, timeout_ms: u32) -> Self {
        Self {
            tx,
            rx,
            de,
            clock,
            timeout_ms,
            frame_gap_ms: DEFAULT_FRAME_GAP_MS,
            last_frame_end: None,
        }
    }

    /// Override the inter-frame silence.
    pub fn with_frame_gap_ms(mut self, ms: u32) -> Self {
        self.frame_gap_ms = ms;
        self
    }

    pub fn free(self) -> (TX, RX, DE, C) {
        (self.tx, self.rx, self.de, self.clock)
    }

    /// Block until the line has been idle for `frame_gap_ms` since the previous transaction.
    fn wait_frame_gap(&mut self) {
        if let Some(end) = self.last_frame_end {
            while elapsed_ms(self.clock.now_ms(), end) < self.frame_gap_ms {}
        }
    }

    /// Drop anything left in the receiver, e.g. a late reply to a timed-out request.
    fn drain_rx(&mut self) {
        for _ in 0..RX_DRAIN_LIMIT {
            if let Err(nb::Error::WouldBlock) = self.rx.read() {
                break;
            }
        }
    }

    fn send(&mut self, frame: &[u8]) -> Result<(), Error<E>> {
        self.de.set_high().map_err(|_| Error::DirectionPin)?;

        let mut result = Ok(());
        for &b in frame {
            if block!(self.tx.write(b)).is_err() {
                result = Err(Error::Tx);
                break;
            }
        }
        if result.is_ok() {
            result = block!(self.tx.flush()).map_err(|_| Error::Tx);
        }

        // Always release the bus, even after a failed send.
        self.de.set_low().map_err(|_| Error::DirectionPin)?;
        result
    }

    /// Collect a response frame, bounded by the response timeout.
    fn receive(&mut self, buf: &mut [u8; WRITE_FRAME_LEN]) -> Result<usize, Error<E>> {
        let started = self.clock.now_ms();
        let mut len = 0;
        let mut expected = WRITE_FRAME_LEN;

        while len < expected {
            match self.rx.read() {
                Ok(b) => {
                    buf[len] = b;
                    len += 1;
                    if len == 2 && buf[1] & EXCEPTION_FLAG != 0 {
                        expected = EXCEPTION_FRAME_LEN;
                    }
                }
                Err(nb::Error::WouldBlock) => {
                    if elapsed_ms(self.clock.now_ms(), started) >= self.timeout_ms {
                        return Err(Error::Timeout);
                    }
                }
                Err(nb::Error::Other(e)) => return Err(Error::Rx(e)),
            }
        }
        Ok(len)
    }

    /// Write `value` into holding register `register` of `device`, waiting for the echo.
    pub fn write_single_register(
        &mut self,
        device: u8,
        register: u16,
        value: u16,
    ) -> Result<(), Error<E>> {
        self.wait_frame_gap();
        let result = self.transact(device, register, value);
        self.last_frame_end = Some(self.clock.now_ms());
        result
    }

    fn transact(&mut self, device: u8, register: u16, value: u16) -> Result<(), Error<E>> {
        let request = write_register_frame(device, register, value);

        self.drain_rx();
        self.send(&request)?;

        let mut response = [0u8; WRITE_FRAME_LEN];
        let len = self.receive(&mut response)?;
        check_response(&request, &response[..len])
    }
}

impl<TX, RX, DE, C, E> Fieldbus for ModbusRtu<TX, RX, DE, C>
where
    TX: serial::Write<u8>,
    RX: serial::Read<u8, Error = E>,
    DE: OutputPin,
    C: Clock,
    E: core::fmt::Debug,
{
    type Error = Error<E>;

    fn write_register(&mut self, device: u8, register: u16, value: u16) -> Result<(), Self::Error> {
        self.write_single_register(device, register, value)
    }
}
