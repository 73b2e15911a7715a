//! Unit tests for mock_device.rs

use std::rc::Rc;

use crate::device::{DeviceCall, DeviceContext, MockBuffer, MockDevice, MockView, ResourceView, UniformBuffer};
use crate::effect::Error;
use crate::shader::ShaderStage;

#[test]
fn test_calls_are_recorded_in_order() {
    let mut device = MockDevice::new();
    let buffer = device.create_uniform_buffer("Frame", 16).unwrap();
    device.update_uniform_buffer(&*buffer, &[0; 16]).unwrap();
    device.dispatch(1, 2, 3);

    assert_eq!(
        device.calls(),
        &[
            DeviceCall::CreateUniformBuffer {
                name: "Frame".to_string(),
                size: 16,
            },
            DeviceCall::UpdateUniformBuffer {
                name: "Frame".to_string(),
                data: vec![0; 16],
            },
            DeviceCall::Dispatch(1, 2, 3),
        ]
    );
    assert_eq!(device.uploads(), vec![("Frame".to_string(), vec![0; 16])]);
}

#[test]
fn test_take_calls_drains_log() {
    let mut device = MockDevice::new();
    device.bind_shader(ShaderStage::Pixel, None);

    let taken = device.take_calls();

    assert_eq!(taken.len(), 1);
    assert!(device.calls().is_empty());
}

#[test]
fn test_upload_size_mismatch_is_rejected() {
    let mut device = MockDevice::new();
    let buffer = MockBuffer {
        name: "Frame".to_string(),
        size: 32,
    };

    let result = device.update_uniform_buffer(&buffer, &[0; 16]);

    assert!(matches!(result, Err(Error::BackendError(_))));
    assert!(device.uploads().is_empty());
    assert_eq!(buffer.size(), 32);
}

#[test]
fn test_resource_labels_keep_empty_slots() {
    let mut device = MockDevice::new();
    let view: Rc<dyn ResourceView> = MockView::new("albedo");

    device.bind_resources(ShaderStage::Pixel, 3, &[Some(view), None]);

    assert_eq!(
        device.count(|c| matches!(c, DeviceCall::BindResources { start_slot: 3, .. })),
        1
    );
    assert!(device.calls().contains(&DeviceCall::BindResources {
        stage: ShaderStage::Pixel,
        start_slot: 3,
        views: vec![Some("albedo".to_string()), None],
    }));
}
