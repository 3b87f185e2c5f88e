//! USB composite device: keyboard, mouse and CDC-ACM serial port
//!
//! The device is polled from the USB interrupt which also moves received
//! serial data into a queue. Tasks with lower priority access the device
//! through an [`rtic::Mutex`], locking it separately for each attempt so that
//! the USB interrupt can always run in between.

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::serial;
use heapless::spsc::{Consumer, Producer};
use rtic::Mutex;
use stm32f0xx_hal::usb;
use usb_device::bus::UsbBusAllocator;
use usb_device::device::{UsbDevice, UsbDeviceBuilder, UsbDeviceState, UsbVidPid};
use usb_device::UsbError;
use usbd_hid::descriptor::{KeyboardReport as UsbKeyboardReport, MouseReport as UsbMouseReport, SerializedDescriptor};
use usbd_hid::hid_class::HIDClass;

use super::AsmDelay;
use crate::config::{HID_READY_RETRIES, MAX_PAYLOAD_SIZE};
use crate::hid::{self, HidTransport, KeyboardReport, MouseReport};

type Bus = usb::UsbBusType;

/// HID endpoint polling interval
const HID_POLL_MS: u8 = 10;

/// USB resources and class implementations
pub struct Usb {
    pub dev: UsbDevice<'static, Bus>,
    pub serial: usbd_serial::SerialPort<'static, Bus>,
    pub keyboard: HIDClass<'static, Bus>,
    pub mouse: HIDClass<'static, Bus>,
}

impl Usb {
    pub fn new(bus: &'static UsbBusAllocator<Bus>) -> Self {
        // Classes
        let serial = usbd_serial::SerialPort::new(bus);
        let keyboard = HIDClass::new(bus, UsbKeyboardReport::desc(), HID_POLL_MS);
        let mouse = HIDClass::new(bus, UsbMouseReport::desc(), HID_POLL_MS);

        // Device
        // VID:PID recognised as Van Ooijen Technische Informatica:Keyboard
        let generic_keyboard = UsbVidPid(0x16c0, 0x27db);
        let dev = UsbDeviceBuilder::new(bus, generic_keyboard)
            .manufacturer("footmouse")
            .product("footmouse pedal")
            .serial_number(env!("CARGO_PKG_VERSION"))
            .composite_with_iads()
            .build();

        Self { dev, serial, keyboard, mouse }
    }

    /// Periodic USB poll
    pub fn poll(&mut self) -> bool {
        self.dev.poll(&mut [&mut self.keyboard, &mut self.mouse, &mut self.serial])
    }

    pub fn configured(&self) -> bool {
        self.dev.state() == UsbDeviceState::Configured
    }

    /// Move received serial data to the queue, returns number of bytes queued
    ///
    /// Bytes that do not fit are dropped, the frame decoder recovers from that.
    pub fn receive_serial<const N: usize>(&mut self, queue: &mut Producer<'_, u8, N>) -> usize {
        let mut buf = [0u8; 64];
        let count = match self.serial.read(&mut buf) {
            Ok(count) => count,
            Err(UsbError::WouldBlock) => return 0,
            Err(_) => {
                warn!("Serial read failed");
                return 0;
            },
        };

        let queued = buf[..count].iter()
            .take_while(|&&byte| queue.enqueue(byte).is_ok())
            .count();
        if queued < count {
            warn!("Serial queue full, dropped {=usize} bytes", count - queued);
        }
        queued
    }
}

/// Serial byte source reading from the receive queue
pub struct QueueSource<'a, 'q, const N: usize> {
    queue: &'a mut Consumer<'q, u8, N>,
}

impl<'a, 'q, const N: usize> QueueSource<'a, 'q, N> {
    pub fn new(queue: &'a mut Consumer<'q, u8, N>) -> Self {
        Self { queue }
    }
}

impl<'a, 'q, const N: usize> serial::Read<u8> for QueueSource<'a, 'q, N> {
    type Error = core::convert::Infallible;

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        self.queue.dequeue().ok_or(nb::Error::WouldBlock)
    }
}

/// Command reply collected in memory and transmitted after the command finishes
///
/// This keeps the device lock free from serial transmission.
pub struct Reply {
    data: heapless::Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Reply {
    pub const fn new() -> Self {
        Self { data: heapless::Vec::new() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

impl serial::Write<u8> for Reply {
    type Error = ();

    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        self.data.push(word).map_err(|_| nb::Error::Other(()))
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        Ok(())
    }
}

/// Write all data to the serial port
///
/// Gives up after [`HID_READY_RETRIES`] milliseconds without progress, e.g.
/// when the host does not read the port.
pub fn send_serial<M>(usb: &mut M, data: &[u8], delay: &mut AsmDelay) -> Result<(), UsbError>
where
    M: Mutex<T = Usb>,
{
    let mut offset = 0;
    let mut stalled = 0;
    while offset < data.len() {
        match usb.lock(|usb| usb.serial.write(&data[offset..])) {
            Ok(len) if len > 0 => {
                offset += len;
                stalled = 0;
            },
            Ok(_) | Err(UsbError::WouldBlock) => {
                stalled += 1;
                if stalled >= HID_READY_RETRIES {
                    return Err(UsbError::WouldBlock);
                }
                delay.delay_ms(1);
            },
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// [`HidTransport`] on top of the shared USB device
pub struct UsbHid<M> {
    usb: M,
    delay: AsmDelay,
}

impl<M> UsbHid<M>
where
    M: Mutex<T = Usb>,
{
    pub fn new(usb: M, delay: AsmDelay) -> Self {
        Self { usb, delay }
    }

    /// Spin until the endpoint accepts the report
    ///
    /// Locks separately in each iteration, usb_poll must run in between to
    /// free the endpoint.
    fn push(&mut self, mut f: impl FnMut(&mut Usb) -> Result<usize, UsbError>) -> Result<(), hid::Error> {
        for _ in 0..HID_READY_RETRIES {
            match self.usb.lock(&mut f) {
                Ok(len) if len > 0 => return Ok(()),
                Ok(_) | Err(UsbError::WouldBlock) => self.delay.delay_ms(1),
                Err(_) => return Err(hid::Error::Transport),
            }
        }
        Err(hid::Error::NotReady)
    }
}

impl<M> HidTransport for UsbHid<M>
where
    M: Mutex<T = Usb>,
{
    fn ready(&mut self) -> bool {
        self.usb.lock(|usb| usb.configured())
    }

    fn send_keyboard(&mut self, report: &KeyboardReport) -> Result<(), hid::Error> {
        let report = UsbKeyboardReport {
            modifier: report.modifiers.bits(),
            reserved: 0,
            leds: 0,
            keycodes: report.keys,
        };
        self.push(|usb| usb.keyboard.push_input(&report))
    }

    fn send_mouse(&mut self, report: &MouseReport) -> Result<(), hid::Error> {
        let report = UsbMouseReport {
            buttons: report.buttons.bits(),
            x: report.x,
            y: report.y,
            wheel: report.wheel,
            pan: 0,
        };
        self.push(|usb| usb.mouse.push_input(&report))
    }
}
