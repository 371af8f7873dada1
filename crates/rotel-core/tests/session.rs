use rotel_core::{
    Command, Controller, FrameDecoder, MuteState, PowerState, RecordingSink, Session,
    SessionConfig, Source,
};

fn attached() -> Controller<RecordingSink> {
    let mut controller = Controller::new(SessionConfig::default());
    controller.attach(RecordingSink::default());
    controller
}

fn follow_ups(controller: &Controller<RecordingSink>) -> Vec<String> {
    controller
        .sink()
        .map(|sink| sink.written()[Command::INITIAL_QUERIES.len()..].to_vec())
        .unwrap_or_default()
}

#[test]
fn ambiguous_power_is_resolved_by_query() {
    let mut controller = attached();
    controller.on_bytes(b"power=on/standby!");
    assert_eq!(controller.snapshot().power, PowerState::Unknown);
    assert_eq!(follow_ups(&controller), vec!["get_power!"]);

    controller.on_bytes(b"power=on!");
    assert_eq!(controller.snapshot().power, PowerState::On);
    assert_eq!(follow_ups(&controller), vec!["get_power!"]);
}

#[test]
fn decoder_and_session_compose_without_controller() {
    let mut decoder = FrameDecoder::new();
    let mut session = Session::new(SessionConfig::default());
    let mut commands = Vec::new();
    for event in decoder.feed(b"mute=on/off!volume=30!mute=off!source=usb!") {
        commands.extend(session.apply(&event));
    }
    let state = session.snapshot();
    assert_eq!(commands, vec![Command::GetVolume]);
    assert_eq!(state.mute, MuteState::Off);
    assert_eq!(state.volume, "30");
    assert_eq!(state.source, Source::Usb);
}

#[test]
fn selecting_sources_and_volume_writes_literals() {
    let mut controller = attached();
    controller.select_source("Optical 1").unwrap();
    controller.select_source("Coax 2").unwrap();
    controller.set_volume_level(0.42).unwrap();
    controller.send(Command::PowerOff);
    assert_eq!(
        follow_ups(&controller),
        vec!["opt1!", "coax2!", "volume_42!", "power_off!"]
    );
}

#[test]
fn push_notifications_across_fragments_update_state() {
    let mut controller = attached();
    for chunk in [&b"source=op"[..], b"t2!freq=96", b"!display=006,", b"Opt 2!"] {
        controller.on_bytes(chunk);
    }
    let state = controller.snapshot();
    assert_eq!(state.source, Source::Opt2);
    assert_eq!(state.frequency, "96");
    assert_eq!(state.display, "Opt 2!");
    assert_eq!(state.media_title(), "0 🔊  Optical 2 @ 96");
    assert!(controller.take_diagnostics().is_empty());
}
