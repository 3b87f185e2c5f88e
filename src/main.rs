#![no_main]
#![no_std]

use panic_probe as _;
use defmt_rtt as _;
use stm32f0xx_hal as hal;
use footmouse as lib;

#[rtic::app(device = crate::hal::pac, dispatchers = [CEC_CAN])]
mod app {
    use cortex_m::interrupt::free as ifree;
    use heapless::spsc::{Consumer, Producer, Queue};
    use super::hal;
    use hal::prelude::*;
    use usb_device::class_prelude::UsbBusAllocator;

    use super::lib;
    use lib::bsp::{AsmDelay, PedalInputs};
    use lib::bsp::usb::{self, QueueSource, Reply, Usb, UsbHid};
    use lib::config::{CONFIG, N_PEDALS, POLL_PERIOD_US};
    use lib::protocol::FrameDecoder;
    use lib::Footmouse;

    /// Serial bytes buffered between USB interrupt and command processing
    const RX_QUEUE_SIZE: usize = 512;
    const SYSCLK_HZ: u32 = 48_000_000;

    #[shared]
    struct Shared {
        usb: Usb,
        footmouse: Footmouse<N_PEDALS>,
    }

    #[local]
    struct Local {
        timer: hal::timers::Timer<hal::pac::TIM15>,
        pedals: PedalInputs,
        rx_producer: Producer<'static, u8, RX_QUEUE_SIZE>,
        rx_consumer: Consumer<'static, u8, RX_QUEUE_SIZE>,
        decoder: FrameDecoder,
    }

    #[init(local = [
        usb_bus: Option<UsbBusAllocator<hal::usb::UsbBusType>> = None,
        rx_queue: Queue<u8, RX_QUEUE_SIZE> = Queue::new(),
    ])]
    fn init(cx: init::Context) -> (Shared, Local, init::Monotonics) {
        let mut core = cx.core;
        let mut dev = cx.device;

        // Automatically enter sleep mode when leaving an ISR
        if cfg!(feature = "idle-sleep") {
            core.SCB.set_sleeponexit();
        }

        // Clock configuration, HSI48 synchronized to USB SOF
        let mut rcc = dev.RCC
            .configure()
            .enable_crs(dev.CRS)
            .sysclk(SYSCLK_HZ.hz())
            .pclk(24.mhz())
            .hsi48()
            .freeze(&mut dev.FLASH);

        // Pinout
        let gpioa = dev.GPIOA.split(&mut rcc);

        let pedals = ifree(|cs| PedalInputs::new([
            gpioa.pa0.into_pull_up_input(cs).downgrade(),
            gpioa.pa1.into_pull_up_input(cs).downgrade(),
            gpioa.pa2.into_pull_up_input(cs).downgrade(),
        ]));

        // Periodic timer for pedal sampling
        let mut timer = hal::timers::Timer::tim15(dev.TIM15, (1_000_000 / POLL_PERIOD_US).hz(), &mut rcc);
        timer.listen(hal::timers::Event::TimeOut);

        // USB
        let usb = hal::usb::Peripheral {
            usb: dev.USB,
            pin_dp: gpioa.pa12,
            pin_dm: gpioa.pa11,
        };
        let usb_bus = cx.local.usb_bus.insert(hal::usb::UsbBus::new(usb));
        let usb = Usb::new(usb_bus);

        let (rx_producer, rx_consumer) = cx.local.rx_queue.split();

        defmt::info!("footmouse {} ({} build)", lib::built_info::PKG_VERSION, lib::built_info::PROFILE);
        defmt::debug!("Pedals: {=usize}, strict CRC: {=bool}, keep-awake period: {=u32} ms",
            N_PEDALS, CONFIG.protocol.strict_crc, CONFIG.keep_awake.period_ms);

        let shared = Shared {
            usb,
            footmouse: Footmouse::new(&CONFIG),
        };

        let local = Local {
            timer,
            pedals,
            rx_producer,
            rx_consumer,
            decoder: FrameDecoder::new(CONFIG.protocol.strict_crc),
        };

        (shared, local, init::Monotonics())
    }

    /// USB poll
    ///
    /// Handles all classes on every USB interrupt. Received serial data is
    /// queued and the command task is started to decode it.
    #[task(binds = USB, priority = 3, shared = [usb], local = [rx_producer])]
    fn usb_poll(mut cx: usb_poll::Context) {
        let producer = cx.local.rx_producer;
        let queued = cx.shared.usb.lock(|usb| {
            // UsbDevice.poll()->UsbBus.poll() inspects and clears USB interrupt flags.
            // If there was data packet to any class this will return true.
            if usb.poll() {
                usb.receive_serial(producer)
            } else {
                0
            }
        });

        // Already pending means the new bytes will be seen anyway
        if queued > 0 && command::spawn().is_err() {
            defmt::trace!("Command task already pending");
        }
    }

    /// Pedal sampling and keep-awake timing
    #[task(binds = TIM15, priority = 2, shared = [usb, footmouse], local = [
        timer,
        pedals,
        delay: AsmDelay = AsmDelay::new(SYSCLK_HZ),
        now_us: u32 = 0,
    ])]
    fn tick(cx: tick::Context) {
        // Clears interrupt flag
        if cx.local.timer.wait().is_err() {
            return;
        }

        let now = cx.local.now_us.wrapping_add(POLL_PERIOD_US);
        *cx.local.now_us = now;

        let samples = cx.local.pedals.read();
        let delay = cx.local.delay;
        let mut hid = UsbHid::new(cx.shared.usb, *delay);
        let mut footmouse = cx.shared.footmouse;
        if let Err(e) = footmouse.lock(|fm| fm.tick((&mut hid, delay), &samples, now)) {
            defmt::warn!("Tick failed: {}", e);
        }
    }

    /// Decode and execute all frames available in the receive queue
    #[task(priority = 1, capacity = 1, shared = [usb, footmouse], local = [
        rx_consumer,
        decoder,
        delay: AsmDelay = AsmDelay::new(SYSCLK_HZ),
        reply: Reply = Reply::new(),
    ])]
    fn command(cx: command::Context) {
        let command::SharedResources { mut usb, mut footmouse } = cx.shared;
        let command::LocalResources { rx_consumer, decoder, delay, reply } = cx.local;

        while rx_consumer.ready() {
            // Decode without holding any lock, bytes keep arriving from usb_poll
            let frame = match decoder.read_frame(&mut QueueSource::new(rx_consumer), delay) {
                Ok(frame) => frame,
                Err(e) => {
                    defmt::warn!("Frame rejected: {} (last crc {=u32:x})", e, decoder.last_crc());
                    continue;
                },
            };

            reply.clear();
            let mut hid = UsbHid::new(&mut usb, *delay);
            // Failures are logged by the device
            let _ = footmouse.lock(|fm| fm.execute(&frame, &mut *reply, (&mut hid, &mut *delay)));

            if !reply.as_bytes().is_empty() {
                if let Err(e) = usb::send_serial(&mut usb, reply.as_bytes(), delay) {
                    defmt::warn!("Reply of {=usize} bytes not sent: {}", reply.as_bytes().len(), defmt::Debug2Format(&e));
                }
            }
        }
    }

    #[idle]
    fn idle(_cx: idle::Context) -> ! {
        loop {
            if cfg!(feature = "idle-sleep") {
                rtic::export::wfi();
            } else {
                rtic::export::nop();
            }
        }
    }
}
