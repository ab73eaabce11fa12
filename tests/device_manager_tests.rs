// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the device manager

use media_devices::backends::camera::v4l2_utils::FakeV4l2Probe;
use media_devices::backends::camera::{
    FakeScreenCapturerFactory, FakeVideoDeviceCapturerFactory, V4l2Enumerator,
};
use media_devices::backends::fs::FakeFileSystem;
use media_devices::backends::screen::{FakeWindowPicker, UnsupportedWindowPicker};
use media_devices::backends::{FakeAudioEnumerator, FakeVideoEnumerator};
use media_devices::filter::filter_devices;
use media_devices::subsystem::{CountingSubsystem, FakeInitMode};
use media_devices::{
    DEFAULT_DEVICE_ID, DEFAULT_DEVICE_NAME, DesktopDescription, DesktopId, Device, DeviceCategory,
    DeviceError, DeviceManager, DeviceSnapshot, FourCc, ScreencastId, VideoFormat, WindowDescription,
    WindowId,
};
use std::sync::Arc;

const NOT_A_DEVICE: &str = "_NOT A REAL DEVICE_";

fn vga() -> VideoFormat {
    VideoFormat::with_fps(640, 480, 30, FourCc::I420)
}

fn hd() -> VideoFormat {
    VideoFormat::with_fps(1280, 720, 30, FourCc::I420)
}

/// Initialized manager over fakes, with fake capturer factories
fn fake_manager() -> DeviceManager {
    let mut dm = DeviceManager::builder()
        .audio_enumerator(FakeAudioEnumerator::new(
            vec![Device::new("Mic", "alsa_input.usb")],
            vec![Device::new("Speakers", "alsa_output.pci")],
        ))
        .video_enumerator(FakeVideoEnumerator::new(vec![
            Device::new("Integrated Camera", "/dev/video0"),
            Device::new("USB Camera", "/dev/video2"),
        ]))
        .window_picker(FakeWindowPicker::new(
            vec![WindowDescription {
                id: WindowId(0x2a00003),
                title: "Terminal".to_string(),
            }],
            vec![DesktopDescription {
                id: DesktopId(0),
                title: "Desktop 1".to_string(),
                primary: true,
            }],
        ))
        .video_capturer_factory(FakeVideoDeviceCapturerFactory)
        .screen_capturer_factory(FakeScreenCapturerFactory)
        .build();
    dm.init().expect("init with fakes");
    dm
}

/// Host manager over a fake filesystem and probe
fn v4l2_manager(files: Vec<(&str, &str)>, live: &[&str]) -> DeviceManager {
    let enumerator = V4l2Enumerator::new(
        Box::new(FakeFileSystem::new(files)),
        Box::new(FakeV4l2Probe::new(live.iter().copied())),
    );
    let mut dm = DeviceManager::builder()
        .audio_enumerator(FakeAudioEnumerator::default())
        .video_enumerator(enumerator)
        .window_picker(UnsupportedWindowPicker)
        .build();
    dm.init().expect("init");
    dm
}

fn names(devices: &[Device]) -> Vec<&str> {
    devices.iter().map(|d| d.name.as_str()).collect()
}

// ===== Lifecycle =====

#[test]
fn test_startup_shutdown() {
    let mut dm = DeviceManager::new();
    assert!(dm.init().is_ok());
    assert!(dm.is_initialized());
    dm.terminate();
    assert!(!dm.is_initialized());
}

#[test]
fn test_double_init_rejected() {
    let mut dm = fake_manager();
    assert_eq!(dm.init(), Err(DeviceError::AlreadyInitialized));
    dm.terminate();
    assert!(dm.init().is_ok());
}

#[test]
fn test_enumeration_requires_init() {
    let dm = DeviceManager::builder()
        .audio_enumerator(FakeAudioEnumerator::default())
        .video_enumerator(FakeVideoEnumerator::default())
        .window_picker(FakeWindowPicker::default())
        .build();
    assert_eq!(dm.audio_input_devices(), Err(DeviceError::NotInitialized));
    assert_eq!(dm.video_capture_devices(), Err(DeviceError::NotInitialized));
    assert!(matches!(dm.windows(), Err(DeviceError::NotInitialized)));
}

#[test]
fn test_subsystem_refcount_balances() {
    let subsystem = CountingSubsystem::new(FakeInitMode::Succeed);
    let mut dm = DeviceManager::builder()
        .subsystem(Arc::new(subsystem.clone()))
        .window_picker(UnsupportedWindowPicker)
        .build();

    for _ in 0..3 {
        dm.init().unwrap();
        assert_eq!(subsystem.outstanding(), 1);
        dm.terminate();
        assert_eq!(subsystem.outstanding(), 0);
    }
    // Extra terminate releases nothing
    dm.terminate();
    assert_eq!(subsystem.initialize_count(), 3);
    assert_eq!(subsystem.uninitialize_count(), 3);
}

#[test]
fn test_prior_process_init_still_released() {
    let subsystem = CountingSubsystem::new(FakeInitMode::AlreadyInitialized);
    let mut dm = DeviceManager::builder()
        .subsystem(Arc::new(subsystem.clone()))
        .window_picker(UnsupportedWindowPicker)
        .build();
    dm.init().unwrap();
    dm.terminate();
    assert_eq!(subsystem.initialize_count(), 1);
    assert_eq!(subsystem.uninitialize_count(), 1);
}

#[test]
fn test_failed_init_then_terminate_releases_nothing() {
    let subsystem = CountingSubsystem::new(FakeInitMode::Fail);
    let mut dm = DeviceManager::builder()
        .subsystem(Arc::new(subsystem.clone()))
        .window_picker(UnsupportedWindowPicker)
        .build();
    assert!(matches!(dm.init(), Err(DeviceError::SubsystemInit(_))));
    dm.terminate();
    assert_eq!(subsystem.uninitialize_count(), 0);
    assert!(!dm.is_initialized());
}

#[test]
fn test_dropping_initialized_manager_releases() {
    let subsystem = CountingSubsystem::new(FakeInitMode::Succeed);
    let mut dm = DeviceManager::builder()
        .subsystem(Arc::new(subsystem.clone()))
        .window_picker(UnsupportedWindowPicker)
        .build();
    dm.init().unwrap();
    drop(dm);
    assert_eq!(subsystem.outstanding(), 0);
}

// ===== Host enumeration =====

#[test]
fn test_get_devices_on_host() {
    let mut dm = DeviceManager::new();
    dm.init().unwrap();
    let video_ins = dm.video_capture_devices().unwrap();
    let video_again = dm.video_capture_devices().unwrap();
    assert_eq!(video_ins.len(), video_again.len());
    assert!(dm.audio_input_devices().is_ok());
    assert!(dm.audio_output_devices().is_ok());

    // A default camera exists exactly when some camera exists
    assert_eq!(dm.video_capture_device(DEFAULT_DEVICE_NAME).is_ok(), !video_ins.is_empty());
}

#[test]
fn test_host_video_lookup_round_trip() {
    let mut dm = DeviceManager::new();
    dm.init().unwrap();
    assert!(matches!(dm.video_capture_device(NOT_A_DEVICE), Err(DeviceError::NotFound(_))));

    let video_ins = dm.video_capture_devices().unwrap();
    if let Some(first) = video_ins.first() {
        assert!(dm.video_capture_device(DEFAULT_DEVICE_NAME).is_ok());
        let found = dm.video_capture_device(&first.name).unwrap();
        assert_eq!(&found, first);
    }
}

// ===== Lookup =====

#[test]
fn test_audio_default_ids() {
    let dm = fake_manager();
    let input = dm.audio_input_device(DEFAULT_DEVICE_NAME).unwrap();
    assert_eq!(input.id, DEFAULT_DEVICE_ID);
    assert_eq!(input.name, DEFAULT_DEVICE_NAME);
    let output = dm.audio_output_device(DEFAULT_DEVICE_NAME).unwrap();
    assert_eq!(output.id, DEFAULT_DEVICE_ID);
    assert!(output.is_default());
}

#[test]
fn test_bogus_names_not_found() {
    let dm = fake_manager();
    assert!(matches!(dm.audio_input_device(NOT_A_DEVICE), Err(DeviceError::NotFound(_))));
    assert!(matches!(dm.audio_output_device(NOT_A_DEVICE), Err(DeviceError::NotFound(_))));
    assert!(matches!(dm.video_capture_device(NOT_A_DEVICE), Err(DeviceError::NotFound(_))));
}

#[test]
fn test_lookup_by_name() {
    let dm = fake_manager();
    assert_eq!(dm.audio_input_device("Mic").unwrap().id, "alsa_input.usb");
    assert_eq!(dm.audio_output_device("Speakers").unwrap().id, "alsa_output.pci");
    assert_eq!(dm.video_capture_device("USB Camera").unwrap().id, "/dev/video2");
}

#[test]
fn test_default_video_is_first_camera() {
    let dm = fake_manager();
    let first = dm.video_capture_devices().unwrap().remove(0);
    assert_eq!(dm.video_capture_device(DEFAULT_DEVICE_NAME).unwrap(), first);
    assert_eq!(dm.default_video_capture_device().unwrap(), first);
}

#[test]
fn test_default_video_without_cameras() {
    let mut dm = DeviceManager::builder()
        .video_enumerator(FakeVideoEnumerator::default())
        .window_picker(UnsupportedWindowPicker)
        .build();
    dm.init().unwrap();
    assert!(matches!(dm.default_video_capture_device(), Err(DeviceError::NotFound(_))));
}

#[test]
fn test_lists_are_fresh() {
    let dm = fake_manager();
    for category in DeviceCategory::ALL {
        let mut first = dm.devices(category).unwrap();
        let expected = first.clone();
        assert!(!first.is_empty());

        // Changing a returned list must not leak into the next call
        first.push(Device::new(NOT_A_DEVICE, NOT_A_DEVICE));
        let second = dm.devices(category).unwrap();
        assert_eq!(second, expected);
        assert!(second.iter().all(|d| d.name != NOT_A_DEVICE));
    }
}

// ===== Filtering =====

#[test]
fn test_filter_devices() {
    let total = [
        "Google Camera Adapters are tons of fun.",
        "device1",
        "device2",
        "device3",
        "device4",
        "device5",
        "Google Camera Adapter 0",
        "Google Camera Adapter 1",
    ];
    let mut devices: Vec<Device> = total
        .iter()
        .enumerate()
        .map(|(i, name)| Device::new(*name, i.to_string()))
        .collect();

    filter_devices::<&str>(&mut devices, None).unwrap();
    assert_eq!(names(&devices), total.to_vec());

    let exclusions = ["device2", "device4", "Google Camera Adapter"];
    filter_devices(&mut devices, Some(&exclusions[..])).unwrap();
    assert_eq!(names(&devices), vec!["device1", "device3", "device5"]);
}

#[test]
fn test_configured_exclusions_apply_per_category() {
    let mut dm = fake_manager();
    dm.set_exclusions(DeviceCategory::AudioInput, Some(vec!["Mic".to_string()]));
    assert!(dm.audio_input_devices().unwrap().is_empty());
    assert_eq!(dm.audio_output_devices().unwrap().len(), 1);

    dm.set_exclusions(DeviceCategory::AudioInput, None);
    assert_eq!(dm.audio_input_devices().unwrap().len(), 1);
}

// ===== V4L2 name resolution =====

#[test]
fn test_video_capture_devices_sysfs() {
    let dm = v4l2_manager(
        vec![
            ("/dev/video0", ""),
            ("/dev/video5", ""),
            ("/sys/class/video4linux/video0/name", "Video Device 1"),
            ("/sys/class/video4linux/video1/model", "Bad Device"),
            ("/sys/class/video4linux/video5/model", "Video Device 2"),
        ],
        &["/dev/video0", "/dev/video5"],
    );
    let video_ins = dm.video_capture_devices().unwrap();
    assert_eq!(names(&video_ins), vec!["Video Device 1", "Video Device 2"]);
    assert_eq!(video_ins[1].id, "/dev/video5");
}

#[test]
fn test_video_capture_devices_proc() {
    let dm = v4l2_manager(
        vec![
            ("/dev/video0", ""),
            ("/dev/video5", ""),
            ("/proc/video/dev/video0", "param1: value1\nname: Video Device 1\n param2: value2\n"),
            ("/proc/video/dev/video1", "param1: value1\nname: Bad Device\n param2: value2\n"),
            ("/proc/video/dev/video5", "param1: value1\nname:   Video Device 2\n param2: value2\n"),
        ],
        &["/dev/video0", "/dev/video5"],
    );
    let video_ins = dm.video_capture_devices().unwrap();
    assert_eq!(names(&video_ins), vec!["Video Device 1", "Video Device 2"]);
}

#[test]
fn test_video_capture_devices_unknown_layout() {
    let dm = v4l2_manager(
        vec![("/dev/video0", ""), ("/dev/video1", ""), ("/dev/video5", "")],
        &["/dev/video0", "/dev/video5"],
    );
    let video_ins = dm.video_capture_devices().unwrap();
    assert_eq!(names(&video_ins), vec!["/dev/video0", "/dev/video5"]);
}

#[test]
fn test_usb_id_from_sysfs_keys_whitelist() {
    let mut dm = v4l2_manager(
        vec![
            ("/dev/video0", ""),
            ("/sys/class/video4linux/video0/name", "Webcam C270"),
            ("/sys/class/video4linux/video0/device/uevent", ""),
            ("/sys/class/video4linux/video0/idVendor", "046d\n"),
            ("/sys/class/video4linux/video0/idProduct", "0825\n"),
        ],
        &["/dev/video0"],
    );
    let camera = dm.video_capture_device("Webcam C270").unwrap();
    assert_eq!(dm.usb_id(&camera).as_deref(), Some("046d:0825"));

    dm.set_video_capture_device_max_format("046D:0825", vga()).unwrap();
    assert_eq!(dm.max_format_for(&camera), Some(vga()));
}

// ===== Windows and desktops =====

#[test]
fn test_windows_and_desktops() {
    let dm = fake_manager();
    let windows = dm.windows().unwrap();
    assert_eq!(windows.len(), 1);
    let capturer = dm
        .create_screen_capturer(&ScreencastId::from(windows[0].id))
        .unwrap();
    assert!(capturer.is_screencast());

    let desktops = dm.desktops().unwrap();
    assert!(desktops[0].primary);
    assert!(dm.create_screen_capturer(&desktops[0].id.into()).is_ok());
}

#[test]
fn test_windows_unsupported() {
    let mut dm = DeviceManager::builder()
        .window_picker(UnsupportedWindowPicker)
        .build();
    dm.init().unwrap();
    assert!(dm.windows().unwrap_err().is_unsupported());
    assert!(dm.desktops().unwrap_err().is_unsupported());
}

#[test]
fn test_host_windows_skip_when_unsupported() {
    let mut dm = DeviceManager::new();
    dm.init().unwrap();
    match dm.windows() {
        Err(e) if e.is_unsupported() => {}
        Ok(_) | Err(DeviceError::Enumeration(_)) => {}
        Err(e) => panic!("unexpected error: {}", e),
    }
}

// ===== Capturers and format ceilings =====

#[test]
fn test_missing_factories() {
    let mut dm = DeviceManager::builder()
        .window_picker(UnsupportedWindowPicker)
        .without_capturer_factories()
        .build();
    dm.init().unwrap();
    let device = Device::new("cam", "cam_id");
    assert!(matches!(dm.create_video_capturer(&device), Err(DeviceError::NoFactory(_))));
    assert!(matches!(
        dm.create_screen_capturer(&ScreencastId::Desktop(DesktopId(0))),
        Err(DeviceError::NoFactory(_))
    ));

    dm.set_video_device_capturer_factory(Box::new(FakeVideoDeviceCapturerFactory));
    assert!(dm.create_video_capturer(&device).is_ok());
}

#[test]
fn test_capture_constraints_whitelisted() {
    let mut dm = fake_manager();
    let device = Device::new("white", "white_id");
    dm.set_video_capture_device_max_format(&device.name, vga()).unwrap();
    let mut capturer = dm.create_video_capturer(&device).unwrap();
    assert!(capturer.enable_camera_list());
    capturer.set_enable_camera_list(true);
    assert_eq!(capturer.best_capture_format(&hd()), Some(vga()));
}

#[test]
fn test_capture_constraints_hd_whitelisted() {
    let mut dm = fake_manager();
    let device = Device::new("white", "white_id");
    dm.set_video_capture_device_max_format(&device.name, hd()).unwrap();
    let mut capturer = dm.create_video_capturer(&device).unwrap();
    capturer.set_enable_camera_list(true);
    assert_eq!(capturer.best_capture_format(&hd()), Some(hd()));
}

#[test]
fn test_capture_constraints_not_whitelisted() {
    let dm = fake_manager();
    let device = Device::new("regular", "regular_id");
    let mut capturer = dm.create_video_capturer(&device).unwrap();
    assert!(!capturer.enable_camera_list());
    assert_eq!(capturer.max_format(), None);
    capturer.set_enable_camera_list(true);
    assert_eq!(capturer.best_capture_format(&hd()), Some(hd()));
}

#[test]
fn test_capture_constraints_un_whitelisted() {
    let mut dm = fake_manager();
    let device = Device::new("un_white", "un_white_id");
    dm.set_video_capture_device_max_format(&device.name, vga()).unwrap();
    dm.clear_video_capture_device_max_format(&device.name);
    let mut capturer = dm.create_video_capturer(&device).unwrap();
    capturer.set_enable_camera_list(true);
    assert_eq!(capturer.best_capture_format(&hd()), Some(hd()));
}

#[test]
fn test_capture_constraints_wildcard() {
    let mut dm = fake_manager();
    let device = Device::new("any_device", "any_device");
    dm.set_video_capture_device_max_format("*", vga()).unwrap();
    let mut capturer = dm.create_video_capturer(&device).unwrap();
    capturer.set_enable_camera_list(true);
    assert_eq!(capturer.best_capture_format(&hd()), Some(vga()));

    // A named entry takes precedence over the wildcard
    dm.set_video_capture_device_max_format(&device.name, hd()).unwrap();
    let capturer = dm.create_video_capturer(&device).unwrap();
    assert_eq!(capturer.best_capture_format(&hd()), Some(hd()));
}

#[test]
fn test_clear_absent_key_is_noop() {
    let mut dm = fake_manager();
    dm.clear_video_capture_device_max_format("never set");
    assert!(dm.max_formats().is_empty());
}

#[test]
fn test_max_formats_survive_terminate() {
    let mut dm = fake_manager();
    dm.set_video_capture_device_max_format("*", vga()).unwrap();
    dm.terminate();
    dm.init().unwrap();
    assert_eq!(dm.max_format_for(&Device::new("x", "y")), Some(vga()));
}

// ===== Snapshots =====

#[test]
fn test_snapshot_of_unchanged_manager_is_stable() {
    let dm = fake_manager();
    let first = DeviceSnapshot::capture(&dm).unwrap();
    let second = DeviceSnapshot::capture(&dm).unwrap();
    assert!(second.changes_since(&first).is_empty());
    assert_eq!(first.devices(DeviceCategory::VideoCapture).len(), 2);
}

#[test]
fn test_snapshot_sees_new_exclusion_as_removal() {
    let mut dm = fake_manager();
    let before = DeviceSnapshot::capture(&dm).unwrap();
    dm.set_exclusions(DeviceCategory::VideoCapture, Some(vec!["USB".to_string()]));
    let after = DeviceSnapshot::capture(&dm).unwrap();

    let changes = after.changes_since(&before);
    let removed: Vec<_> = changes.removed_in(DeviceCategory::VideoCapture).collect();
    assert_eq!(removed, vec![&Device::new("USB Camera", "/dev/video2")]);
    assert!(changes.added.is_empty());
}
