//! Image passes through the serial bridge firmware engine

use viperflash_bridge::{BridgeConfig, SerialBridge};
use viperflash_core::bridge::FirmwareConfig;
use viperflash_core::flash::{NoProgress, Session, SessionConfig};
use viperflash_core::protocol::SafeMode;
use viperflash_core::{Error, FLASH_SIZE};
use viperflash_dummy::{ChannelTransport, ChipConfig, EmulatedBridge, EmulatedChip};

type BridgeSession = Session<SerialBridge<ChannelTransport>>;

fn session_config(safe_mode: SafeMode) -> SessionConfig {
    SessionConfig {
        safe_mode,
        settle_delay_us: 0,
    }
}

fn bridge_config() -> BridgeConfig {
    BridgeConfig {
        timeout_ms: 300,
        ack_timeout_ms: 300,
        retry_delay_ms: 0,
        ..BridgeConfig::default()
    }
}

fn firmware_config() -> FirmwareConfig {
    FirmwareConfig {
        fault_stall_ms: 1,
        refill_timeout_us: 50_000,
    }
}

fn open(chip: EmulatedChip, safe_mode: SafeMode) -> (EmulatedBridge, BridgeSession) {
    let (emulated, transport) = EmulatedBridge::spawn(chip, firmware_config());
    let bridge = SerialBridge::new(transport, bridge_config()).unwrap();
    let session = Session::open(bridge, session_config(safe_mode)).unwrap();
    (emulated, session)
}

fn close(emulated: EmulatedBridge, session: BridgeSession) -> EmulatedChip {
    drop(session);
    emulated.join().unwrap()
}

fn pattern(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (state >> 16) as u8
        })
        .collect()
}

#[test]
fn test_full_image_round_trip() {
    let image = pattern(FLASH_SIZE, 42);
    let (emulated, mut session) = open(EmulatedChip::new_default(), SafeMode::Enabled);
    assert!(session.streaming());

    let stats = session.write_image(&image, &mut NoProgress).unwrap();
    assert!(stats.streamed);
    assert_eq!(stats.bytes_total, FLASH_SIZE);

    let dump = session.read_image(&mut NoProgress).unwrap();
    assert!(dump == image);
    session.compare_image(&image, &mut NoProgress).unwrap();

    let chip = close(emulated, session);
    assert!(chip.data() == &image[..]);
    assert_eq!(chip.stats().rejected_writes, 0);
}

#[test]
fn test_partial_chunk_is_padded_not_programmed() {
    let image: Vec<u8> = (0..61).collect();
    let (emulated, mut session) = open(EmulatedChip::new_default(), SafeMode::Enabled);

    session.write_image(&image, &mut NoProgress).unwrap();

    let chip = close(emulated, session);
    assert_eq!(&chip.data()[..61], &image[..]);
    // Padding never reaches the chip
    assert!(chip.data()[61..].iter().all(|&b| b == 0xFF));
    // 0x00..0x3C contain no erased bytes
    assert_eq!(chip.stats().writes, 61);
}

#[test]
fn test_compare_over_stream() {
    let mut contents = pattern(0x800, 1);
    let image = contents.clone();
    contents[0x7FF] = contents[0x7FF].wrapping_add(1);

    let chip = EmulatedChip::with_data(ChipConfig::default(), &contents);
    let (emulated, mut session) = open(chip, SafeMode::Enabled);

    let result = session.compare_image(&image, &mut NoProgress);
    assert_eq!(
        result,
        Err(Error::Mismatch {
            addr: 0x7FF,
            expected: image[0x7FF],
            found: contents[0x7FF],
        })
    );
    close(emulated, session);
}

#[test]
fn test_unsafe_host_still_works() {
    let image = pattern(0x300, 8);
    let (emulated, mut session) = open(EmulatedChip::new_default(), SafeMode::Disabled);

    session.write_image(&image, &mut NoProgress).unwrap();
    session.compare_image(&image, &mut NoProgress).unwrap();
    close(emulated, session);
}

#[test]
fn test_fault_during_stream_write_stalls_host() {
    // Reset, init, erase with its settle reads, then 70 programmed bytes
    let fail_after = 1 + 3 + 13 + 4 * 14 + 70 * 9;
    let chip = EmulatedChip::new(ChipConfig {
        fail_after: Some(fail_after),
        ..Default::default()
    });
    let (emulated, mut session) = open(chip, SafeMode::Enabled);

    let result = session.write_image(&[0x00; 300], &mut NoProgress);
    assert_eq!(result.err(), Some(Error::StreamStall));

    let chip = close(emulated, session);
    assert_eq!(chip.stats().writes, 70);
}

#[test]
fn test_fault_in_final_chunk_fails_the_write() {
    // Dies on byte 65 of 70, after the last chunk was acknowledged
    let fail_after = 1 + 3 + 13 + 4 * 14 + 65 * 9;
    let chip = EmulatedChip::new(ChipConfig {
        fail_after: Some(fail_after),
        ..Default::default()
    });
    let (emulated, mut session) = open(chip, SafeMode::Enabled);

    let result = session.write_image(&[0x00; 70], &mut NoProgress);
    assert_eq!(result.err(), Some(Error::StreamStall));

    let chip = close(emulated, session);
    assert_eq!(chip.stats().writes, 65);
}

#[test]
fn test_fault_during_stream_read_stalls_host() {
    // Reset, init, read-init, then 100 bytes
    let fail_after = 1 + 3 + 5 + 100 * 9;
    let chip = EmulatedChip::new(ChipConfig {
        fail_after: Some(fail_after),
        ..Default::default()
    });
    let (emulated, mut session) = open(chip, SafeMode::Enabled);

    let result = session.read_image(&mut NoProgress);
    assert_eq!(result.err(), Some(Error::StreamStall));
    close(emulated, session);
}

#[test]
fn test_missing_chip_behind_bridge() {
    let chip = EmulatedChip::new(ChipConfig {
        present: false,
        ..Default::default()
    });
    let (emulated, transport) = EmulatedBridge::spawn(chip, firmware_config());
    let bridge = SerialBridge::new(transport, bridge_config()).unwrap();

    let result = Session::open(bridge, session_config(SafeMode::Enabled));
    assert!(matches!(result, Err(Error::ChipNotPresent)));
    emulated.join().unwrap();
}
