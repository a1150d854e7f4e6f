use clap::Parser;
use core::cell::RefCell;
use core::sync::atomic::{AtomicU32, Ordering};
use embassy_executor::{Executor, Spawner};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use embedded_hal_bus::i2c::CriticalSectionDevice;
use gz_core::mk_static;
use gz_core::utils::controllers::SystemController;
use gz_core::utils::events::{GestureEvent, LineEvent};
use gz_core::utils::{DeviceClass, Duration, HandlerTable, Poller, SensorHub, SystemCommand, Timer};
use static_cell::StaticCell;
use tracing::{debug, error, info, warn};

const SOUND: u8 = 0x06;
const BUZZER: u8 = 0x08;
const GESTURE: u8 = 0x0C;
const ENCODER: u8 = 0x10;
const LINER: u8 = 0x27;

type Bus = CriticalSectionDevice<'static, SimBus>;
type SharedBus = critical_section::Mutex<RefCell<SimBus>>;
type Table = HandlerTable<CriticalSectionRawMutex>;
type Hub = SensorHub<CriticalSectionRawMutex, Bus, Table>;

static COMMANDS: Channel<CriticalSectionRawMutex, SystemCommand, 8> = Channel::new();
static LINE_EVENTS: AtomicU32 = AtomicU32::new(0);

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts
{
    /// line follower sampling interval in milliseconds
    #[clap(long, default_value_t = 50)]
    poll_ms: u64,
    /// number of intervals to simulate before shutting down
    #[clap(long, default_value_t = 24)]
    ticks: u32,
    /// line follower statuses to replay, repeated once exhausted
    #[clap(long, value_delimiter = ',', default_values_t = [0u8, 1, 1, 3, 3, 3, 2, 2, 4, 0])]
    line: Vec<u8>,
    /// JSON command to execute, e.g. '{"ct":"b","bc":"melody","m":"power_up"}'
    #[clap(long = "command")]
    commands: Vec<String>,
}

/// Stand-in for the Grove Zero bus: answers every module the hub talks to
/// and logs what the drivers write.
struct SimBus
{
    line: Vec<u8>,
    step: usize,
    pending: Option<(u8, u8)>,
    tempo: u16,
    gesture: u8,
}

impl SimBus
{
    fn new(line: Vec<u8>) -> Self {
        SimBus {
            line,
            step: 0,
            pending: None,
            tempo: 120,
            gesture: 0,
        }
    }

    fn write_frame(
        &mut self,
        address: u8,
        frame: &[u8],
    ) -> Result<(), ErrorKind> {
        if ![SOUND, BUZZER, GESTURE, ENCODER, LINER].contains(&address) {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        let Some(&command) = frame.first() else {
            return Ok(());
        };
        debug!("write {:#04x}: {:02x?}", address, frame);

        match (address, frame) {
            (BUZZER, [0x05, lo, hi, ..]) => self.tempo = u16::from_le_bytes([*lo, *hi]),
            (BUZZER, [0x06, sign, lo, hi, ..]) => {
                let delta = u16::from_le_bytes([*lo, *hi]);
                self.tempo = match *sign {
                    0 => self.tempo.saturating_sub(delta),
                    _ => self.tempo.saturating_add(delta),
                };
            }
            (BUZZER, [0x12, lo, hi, ms_lo, ms_hi]) => info!(
                "buzzer tone {} Hz for {} ms",
                u16::from_le_bytes([*lo, *hi]),
                u16::from_le_bytes([*ms_lo, *ms_hi])
            ),
            (BUZZER, [0x03, melody, ..]) => info!("buzzer melody #{}", melody),
            _ => {}
        }
        self.pending = Some((address, command));
        Ok(())
    }

    fn read_reply(
        &mut self,
        address: u8,
        buffer: &mut [u8],
    ) -> Result<(), ErrorKind> {
        buffer.fill(0);
        let reply: &[u8] = match self.pending.take() {
            Some((LINER, 0x02)) => {
                let status = self.line.get(self.step % self.line.len().max(1)).copied();
                self.step += 1;
                return fill(buffer, &[status.unwrap_or(0)]);
            }
            Some((LINER, 0x03)) => &[0x04],
            Some((LINER, 0x04)) => &[0x20, 0x80, 0xF0, 0x00],
            Some((SOUND, 0x02)) => &[0x2C, 0x01],
            Some((SOUND, 0x00)) => &[3],
            Some((GESTURE, 0x00)) => {
                self.gesture = self.gesture % 9 + 1;
                return fill(buffer, &[self.gesture]);
            }
            Some((ENCODER, 0x00)) => &[3],
            Some((BUZZER, 0x07)) => return fill(buffer, &self.tempo.to_le_bytes()),
            Some(_) => &[],
            _ => {
                warn!("read {:#04x} without a preceding command", address);
                return Err(ErrorKind::Other);
            }
        };
        fill(buffer, reply)
    }
}

fn fill(
    buffer: &mut [u8],
    reply: &[u8],
) -> Result<(), ErrorKind> {
    let n = buffer.len().min(reply.len());
    buffer[..n].copy_from_slice(&reply[..n]);
    Ok(())
}

impl ErrorType for SimBus
{
    type Error = ErrorKind;
}

impl I2c for SimBus
{
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for operation in operations {
            match operation {
                Operation::Write(frame) => self.write_frame(address, frame)?,
                Operation::Read(buffer) => self.read_reply(address, buffer)?,
            }
        }
        Ok(())
    }
}

#[embassy_executor::task]
async fn poll_task(poller: Poller<'static, CriticalSectionRawMutex, Bus, Table>) {
    poller.run().await
}

#[embassy_executor::task]
async fn command_task(mut ctrl: SystemController<'static, CriticalSectionRawMutex, Bus, Table, Bus>) -> ! {
    ctrl.command_ch(COMMANDS.receiver()).await
}

fn register_handlers(hub: &Hub) {
    for event in [LineEvent::Left, LineEvent::Right, LineEvent::Straight, LineEvent::End] {
        let registered = hub.on_line(event, move || {
            LINE_EVENTS.fetch_add(1, Ordering::Relaxed);
            info!("line follower: {:?}", event);
        });
        if let Err(e) = registered {
            error!("line handler not registered: {:?}", e);
        }
    }

    if let Err(e) = hub.on_gesture(GestureEvent::Wave, || info!("gesture: wave")) {
        error!("gesture handler not registered: {:?}", e);
    }
    if let Err(e) = hub.on_loud_sound(|| info!("loud sound")) {
        error!("sound handler not registered: {:?}", e);
    }
}

fn report(hub: &Hub) {
    info!("line events raised: {}", LINE_EVENTS.load(Ordering::Relaxed));
    for class in DeviceClass::ALL {
        info!("{:?}: active={} last={:?}", class, hub.is_subscribed(class), hub.last_status(class));
    }
    match hub.was_line_triggered(LineEvent::End) {
        Ok(end) => info!("line end reached last: {}", end),
        Err(e) => error!("line query failed: {:?}", e),
    }
    match hub.sound_level() {
        Ok(level) => info!("sound level: {}", level),
        Err(e) => error!("sound level read failed: {:?}", e),
    }
}

#[embassy_executor::task]
async fn main_task(spawner: Spawner) {
    let opts: Opts = Opts::parse();
    let interval = Duration::from_millis(opts.poll_ms);

    let bus: &'static SharedBus = mk_static!(
        SharedBus,
        critical_section::Mutex::new(RefCell::new(SimBus::new(opts.line)))
    );
    let hub: &'static Hub = mk_static!(
        Hub,
        SensorHub::new(CriticalSectionDevice::new(bus), HandlerTable::new(), Some(interval))
    );

    if let Some(poller) = hub.poller(DeviceClass::Line) {
        spawner.spawn(poll_task(poller)).unwrap();
    }
    spawner
        .spawn(command_task(SystemController::new(hub, CriticalSectionDevice::new(bus))))
        .unwrap();

    register_handlers(hub);

    for json in &opts.commands {
        match serde_json::from_str::<SystemCommand>(json) {
            Ok(command) => COMMANDS.send(command).await,
            Err(e) => error!("invalid command {}: {}", json, e),
        }
    }

    for tick in 0..opts.ticks {
        Timer::after(interval).await;
        // gesture and sound modules raise their interrupt every few intervals
        if tick % 4 == 3 {
            for class in [DeviceClass::Gesture, DeviceClass::Sound] {
                if let Err(e) = hub.service(class) {
                    error!("{:?} service failed: {:?}", class, e);
                }
            }
        }
    }

    report(hub);
    hub.shutdown();
    Timer::after(interval).await;
    std::process::exit(0);
}

static EXECUTOR: StaticCell<Executor> = StaticCell::new();

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        spawner.spawn(main_task(spawner)).unwrap();
    });
}
