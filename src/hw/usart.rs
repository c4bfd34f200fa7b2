// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! USART abstraction layer.
//!
//! [`Usart`] wraps the transmit half of a HAL serial port with string helpers. The debug port
//! (USART1) additionally backs the global [`log`] logger: [`init_logger`] parks it in a
//! critical-section mutex and every record is printed as `[LEVEL] message` with a CRLF terminator.
//!
//! To access the terminal on the host machine, connect to the debug USB port and use
//! ```text
//! $ screen /dev/tty.usbmodem* 115200
//! ```

use core::cell::RefCell;
use core::fmt::{self, Write as _};

use cortex_m::interrupt::{self, Mutex};
use embedded_hal::serial;
use log::{LevelFilter, Log, Metadata, Record};
use nb::block;

use stm32f7xx_hal::{
    pac,
    prelude::*,
    serial::{Instance, Tx},
};

pub struct Usart<U: Instance> {
    tx: Tx<U>,
}

impl<U: Instance> Usart<U> {
    pub fn new(tx: Tx<U>) -> Self {
        Self { tx }
    }

    #[inline]
    pub fn write_byte(&mut self, b: u8) {
        let _ = block!(self.tx.write(b));
    }

    pub fn write_str(&mut self, s: &str) {
        for &b in s.as_bytes() {
            self.write_byte(b);
        }
    }

    /// Write string and CRLF terminator.
    #[inline]
    pub fn println(&mut self, s: &str) {
        self.write_str(s);
        self.write_str("\r\n");
    }

    /// Block until the hardware TX FIFO/drain is flushed.
    #[inline]
    pub fn flush(&mut self) {
        let _ = block!(self.tx.flush());
    }
}

impl<U: Instance> fmt::Write for Usart<U> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        Usart::write_str(self, s);
        Ok(())
    }
}

/// Pull at most `limit` pending bytes out of `rx` without blocking.
///
/// Receive errors (overrun, framing) drop the offending byte; the line parsers resynchronise on
/// the next newline.
pub fn poll_bytes<R, F>(rx: &mut R, limit: usize, mut on_byte: F)
where
    R: serial::Read<u8>,
    F: FnMut(u8),
{
    for _ in 0..limit {
        match rx.read() {
            Ok(b) => on_byte(b),
            Err(nb::Error::WouldBlock) => break,
            Err(nb::Error::Other(_)) => {}
        }
    }
}

static LOG_PORT: Mutex<RefCell<Option<Usart<pac::USART1>>>> = Mutex::new(RefCell::new(None));

struct UsartLogger;

static LOGGER: UsartLogger = UsartLogger;

impl Log for UsartLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        interrupt::free(|cs| {
            if let Some(port) = LOG_PORT.borrow(cs).borrow_mut().as_mut() {
                let _ = write!(port, "[{}] {}\r\n", record.level(), record.args());
            }
        });
    }

    fn flush(&self) {
        interrupt::free(|cs| {
            if let Some(port) = LOG_PORT.borrow(cs).borrow_mut().as_mut() {
                port.flush();
            }
        });
    }
}

/// Route the `log` facade to the debug USART.
pub fn init_logger(port: Usart<pac::USART1>, level: LevelFilter) {
    interrupt::free(|cs| {
        LOG_PORT.borrow(cs).replace(Some(port));
    });
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
