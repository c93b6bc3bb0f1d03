//! # Integration Tests
//!
//! End-to-end scenarios against the simulated camera.
//!
//! Covers:
//! - Configuration document to running driver
//! - Bootstrap, mask gating and staleness recovery
//! - Timestamp fallback and extrinsics handling
//! - Commands contending with the acquisition loop

#[cfg(test)]
mod contract_tests {
    use contracts::{Channel, SchemaMask, Topic};

    #[test]
    fn test_every_gated_channel_has_a_topic() {
        for channel in Channel::PUBLISH_ORDER {
            assert_eq!(Topic::for_channel(channel).channel(), Some(channel));
            assert!(SchemaMask::from_bits(0xffff).contains(channel));
        }
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use chrono::{TimeDelta, Utc};
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        CommandRequest, CommandResponse, CommandService, DeviceError, DriverConfig,
        OutputMessage, SchemaMask, Topic, STATUS_RUNTIME_ERROR,
    };
    use device_session::{SimulatedCamera, SimulatorConfig, SimulatorProbe};
    use driver::{AcquisitionStats, CameraDriver, CommandHandlers, DriverHandle};
    use publisher::{create_sinks, MemorySink, SinkSet};

    const CONFIG: &str = r#"
[camera]
ip = "127.0.0.1"
pcic_port = 50010
schema_mask = 9
frame_id_base = "tof"

[acquisition]
timeout_millis = 20
timeout_tolerance_secs = 5.0
soft_on_timeout_millis = 20
soft_on_timeout_tolerance_secs = 5.0
soft_off_timeout_millis = 20
soft_off_timeout_tolerance_secs = 600.0
settle_delay_millis = 0
retry_backoff_millis = 10

[[sinks]]
name = "mem"
sink_type = "memory"
queue_capacity = 1024
"#;

    const REQUESTED: SchemaMask = SchemaMask::from_bits(9);

    fn config() -> DriverConfig {
        ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap()
    }

    fn sim() -> SimulatorConfig {
        SimulatorConfig {
            width: 16,
            height: 8,
            frame_period: Duration::from_millis(5),
            ..Default::default()
        }
    }

    struct Rig {
        handle: DriverHandle<SimulatedCamera>,
        sinks: SinkSet,
        memory: Arc<MemorySink>,
        probe: SimulatorProbe,
        stats: Arc<AcquisitionStats>,
    }

    impl Rig {
        fn start(config: DriverConfig, sim: SimulatorConfig) -> Self {
            let camera = SimulatedCamera::new(sim);
            let probe = camera.probe();
            let sinks = create_sinks(&config.sinks);
            let memory = sinks.memory("mem").unwrap();
            let handle = CameraDriver::spawn(camera, &config, sinks.output()).unwrap();
            let stats = handle.stats();
            Self {
                handle,
                sinks,
                memory,
                probe,
                stats,
            }
        }

        fn commands(&self) -> Arc<CommandHandlers<SimulatedCamera>> {
            self.handle.commands()
        }

        /// Join the acquisition thread and drain the sinks
        async fn stop(self) -> (Arc<MemorySink>, SimulatorProbe, Arc<AcquisitionStats>) {
            let handle = self.handle;
            tokio::task::spawn_blocking(move || handle.join())
                .await
                .unwrap();
            self.sinks.shutdown().await;
            (self.memory, self.probe, self.stats)
        }
    }

    async fn wait_for(condition: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    async fn call(
        commands: &Arc<CommandHandlers<SimulatedCamera>>,
        request: CommandRequest,
    ) -> CommandResponse {
        let commands = commands.clone();
        tokio::task::spawn_blocking(move || commands.call(request))
            .await
            .unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_e2e_bootstrap_and_stream() {
        let rig = Rig::start(config(), sim());
        let stats = rig.stats.clone();
        assert!(wait_for(|| stats.published(Topic::Extrinsics) >= 5).await);

        let (memory, probe, stats) = rig.stop().await;

        assert_eq!(
            probe.opened_masks()[..2],
            [SchemaMask::UNIT_VECTORS, REQUESTED]
        );
        assert_eq!(memory.count(Topic::UnitVectors), 1);
        let Some(OutputMessage::Image(unit)) = memory.latched(Topic::UnitVectors) else {
            panic!("unit vectors not latched");
        };
        assert_eq!(unit.encoding, "32FC3");
        assert_eq!(unit.header.frame_id, "tof_optical_link");

        let order = memory.publish_order();
        assert_eq!(
            order[..5],
            [
                Topic::UnitVectors,
                Topic::Confidence,
                Topic::Cloud,
                Topic::Distance,
                Topic::Extrinsics
            ]
        );
        for gated_off in [
            Topic::Amplitude,
            Topic::RawAmplitude,
            Topic::GrayImage,
            Topic::DistanceNoise,
            Topic::RgbImage,
        ] {
            assert_eq!(memory.count(gated_off), 0, "{gated_off} should be gated");
        }

        let OutputMessage::PointCloud(cloud) = &memory.messages(Topic::Cloud)[0] else {
            panic!("cloud record expected");
        };
        assert_eq!((cloud.width, cloud.height), (16, 8));
        assert_eq!(cloud.point_step, 12);
        assert_eq!(cloud.row_step, 12 * 16);
        assert_eq!(cloud.data.len(), 12 * 16 * 8);
        assert_eq!(cloud.header.frame_id, "tof_link");

        let OutputMessage::Image(distance) = &memory.messages(Topic::Distance)[0] else {
            panic!("distance image expected");
        };
        assert_eq!(distance.encoding, "16UC1");
        assert_eq!(distance.step, 32);

        let OutputMessage::Extrinsics(extrinsics) = &memory.messages(Topic::Extrinsics)[0] else {
            panic!("extrinsics expected");
        };
        assert!((extrinsics.tx - 0.01).abs() < 1e-6);
        assert_eq!(extrinsics.header.frame_id, "tof_optical_link");

        assert!(stats.is_streaming());
        assert_eq!(probe.live_sessions(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_e2e_unit_vectors_once_across_recoveries() {
        let mut config = config();
        config.acquisition.timeout_tolerance_secs = 0.1;
        let sim = SimulatorConfig {
            stall_after: Some(3),
            ..sim()
        };
        let rig = Rig::start(config, sim);
        let stats = rig.stats.clone();
        assert!(wait_for(|| stats.snapshot().restarts >= 3).await);

        let (memory, probe, stats) = rig.stop().await;
        let masks = probe.opened_masks();
        assert_eq!(masks[0], SchemaMask::UNIT_VECTORS);
        assert!(masks[1..].iter().all(|mask| *mask == REQUESTED));
        assert!(masks.len() >= 5);

        assert_eq!(memory.count(Topic::UnitVectors), 1);
        assert!(memory.count(Topic::Cloud) >= 6);
        assert!(stats.snapshot().wait_timeouts > 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_e2e_recovery_before_bootstrap_keeps_minimal_mask() {
        let mut config = config();
        config.acquisition.timeout_tolerance_secs = 0.1;
        let sim = SimulatorConfig {
            stall_after: Some(0),
            ..sim()
        };
        let rig = Rig::start(config, sim);
        let stats = rig.stats.clone();
        assert!(wait_for(|| stats.snapshot().restarts >= 2).await);

        let (memory, probe, stats) = rig.stop().await;
        assert!(probe
            .opened_masks()
            .iter()
            .all(|mask| *mask == SchemaMask::UNIT_VECTORS));
        assert_eq!(memory.total(), 0);
        assert!(!stats.is_streaming());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_e2e_time_sync_fallback() {
        let sim = SimulatorConfig {
            clock_offset: TimeDelta::hours(-3),
            ..sim()
        };
        let rig = Rig::start(config(), sim);
        let stats = rig.stats.clone();
        assert!(wait_for(|| stats.published(Topic::Cloud) >= 3).await);

        let (memory, _probe, stats) = rig.stop().await;
        let now = Utc::now();
        for message in memory.messages(Topic::Cloud) {
            assert!((now - message.header().stamp).abs() < TimeDelta::minutes(1));
        }
        let snapshot = stats.snapshot();
        assert!(snapshot.time_sync_fallbacks >= 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_e2e_device_stamp_kept_within_threshold() {
        let sim = SimulatorConfig {
            clock_offset: TimeDelta::seconds(-30),
            ..sim()
        };
        let rig = Rig::start(config(), sim);
        let stats = rig.stats.clone();
        assert!(wait_for(|| stats.published(Topic::Cloud) >= 2).await);

        let (memory, _probe, stats) = rig.stop().await;
        let stamp = memory.messages(Topic::Cloud)[0].header().stamp;
        let skew = Utc::now() - stamp;
        assert!(skew > TimeDelta::seconds(25));
        assert_eq!(stats.snapshot().time_sync_fallbacks, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_e2e_short_extrinsics_zeroed() {
        let sim = SimulatorConfig {
            extrinsics: vec![1.0, 2.0],
            ..sim()
        };
        let rig = Rig::start(config(), sim);
        let stats = rig.stats.clone();
        assert!(wait_for(|| stats.published(Topic::Extrinsics) >= 1).await);

        let (memory, _probe, _stats) = rig.stop().await;
        let OutputMessage::Extrinsics(extrinsics) = &memory.messages(Topic::Extrinsics)[0] else {
            panic!("extrinsics expected");
        };
        assert_eq!(
            (extrinsics.tx, extrinsics.ty, extrinsics.rot_z),
            (0.0, 0.0, 0.0)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_e2e_rgb_stream() {
        let sim = SimulatorConfig { rgb: true, ..sim() };
        let rig = Rig::start(config(), sim);
        let stats = rig.stats.clone();
        assert!(wait_for(|| stats.published(Topic::RgbImage) >= 1).await);

        let (memory, _probe, _stats) = rig.stop().await;
        let OutputMessage::CompressedImage(rgb) = &memory.messages(Topic::RgbImage)[0] else {
            panic!("compressed image expected");
        };
        assert_eq!(rgb.format, "jpeg");
        assert_eq!(rgb.data[..2], [0xFF, 0xD8]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_e2e_commands_contend_with_acquisition() {
        let mut config = config();
        config.acquisition.timeout_tolerance_secs = 0.1;
        config.acquisition.soft_on_timeout_tolerance_secs = 0.1;
        let rig = Rig::start(config, sim());
        let stats = rig.stats.clone();
        assert!(wait_for(|| stats.is_streaming()).await);

        let commands = rig.commands();
        let dumps: Vec<_> = (0..8)
            .map(|_| {
                let commands = commands.clone();
                tokio::task::spawn_blocking(move || commands.call(CommandRequest::Dump))
            })
            .collect();
        for dump in dumps {
            let CommandResponse::Dump(response) = dump.await.unwrap() else {
                panic!("dump response expected");
            };
            assert_eq!(response.status, 0);
            let document: serde_json::Value = serde_json::from_str(&response.config).unwrap();
            assert!(document["ports"].is_object());
        }

        // soft-off: frames stop, the long soft-off tolerance prevents restarts
        let response = call(&commands, CommandRequest::SoftOff).await;
        let CommandResponse::Status(status) = response else {
            panic!("status response expected");
        };
        assert_eq!(status.status, 0);
        assert_eq!(status.msg, r#"{"ports":{"port0":{"state":"IDLE"}}}"#);

        let restarts = stats.snapshot().restarts;
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(stats.snapshot().restarts, restarts);

        // soft-on: frames resume under the soft-on regime
        let frames = stats.frames();
        let response = call(&commands, CommandRequest::SoftOn).await;
        assert_eq!(response.status(), 0);
        assert!(wait_for(|| stats.frames() > frames + 5).await);

        let response = call(&commands, CommandRequest::Trigger).await;
        assert_eq!(response.status(), 0);

        let (_memory, probe, _stats) = rig.stop().await;
        let fragments = probe.applied_fragments();
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[1]["ports"]["port0"]["state"], "RUN");
        assert_eq!(probe.trigger_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_e2e_dump_sees_whole_session_across_restarts() {
        let mut config = config();
        config.acquisition.timeout_tolerance_secs = 0.01;
        let sim = SimulatorConfig {
            stall_after: Some(1),
            ..sim()
        };
        let rig = Rig::start(config, sim);
        let stats = rig.stats.clone();
        let commands = rig.commands();

        let (complete, absent) = tokio::task::spawn_blocking(move || {
            let deadline = Instant::now() + Duration::from_secs(10);
            let (mut complete, mut absent) = (0u32, 0u32);
            while stats.snapshot().restarts < 20 && Instant::now() < deadline {
                let CommandResponse::Dump(response) = commands.call(CommandRequest::Dump) else {
                    panic!("dump response expected");
                };
                match response.status {
                    0 => {
                        let document: serde_json::Value =
                            serde_json::from_str(&response.config).unwrap();
                        assert!(document["ports"]["port0"].is_object());
                        complete += 1;
                    }
                    STATUS_RUNTIME_ERROR => {
                        assert!(response.config.is_empty());
                        absent += 1;
                    }
                    other => panic!("partial session observed: status {other}"),
                }
            }
            (complete, absent)
        })
        .await
        .unwrap();

        let (_memory, probe, stats) = rig.stop().await;
        assert!(stats.snapshot().restarts >= 20);
        assert!(complete > 0);
        assert!(complete + absent > 20);
        assert_eq!(probe.live_sessions(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_e2e_config_error_codes() {
        let sim = SimulatorConfig {
            config_error: Some(DeviceError::new(101015, "parameter out of range")),
            ..sim()
        };
        let rig = Rig::start(config(), sim);
        let stats = rig.stats.clone();
        assert!(wait_for(|| stats.is_streaming()).await);
        let commands = rig.commands();

        let response = call(
            &commands,
            CommandRequest::Config {
                json: r#"{"ports":{"port0":{"mode":"x"}}}"#.to_string(),
            },
        )
        .await;
        let CommandResponse::Status(status) = response else {
            panic!("status response expected");
        };
        assert_eq!(status.status, 101015);
        assert_eq!(status.msg, "parameter out of range");

        let response = call(
            &commands,
            CommandRequest::Config {
                json: "{not json".to_string(),
            },
        )
        .await;
        assert_eq!(response.status(), STATUS_RUNTIME_ERROR);

        let response = call(&commands, CommandRequest::SoftOff).await;
        assert_eq!(response.status(), 101015);

        let response = call(&commands, CommandRequest::Dump).await;
        assert_eq!(response.status(), 0);

        let frames = stats.frames();
        assert!(wait_for(|| stats.frames() > frames + 3).await);
        rig.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_e2e_connect_refusals_retried() {
        let sim = SimulatorConfig {
            fail_connects: 4,
            ..sim()
        };
        let rig = Rig::start(config(), sim);
        let stats = rig.stats.clone();
        assert!(wait_for(|| stats.published(Topic::Cloud) >= 1).await);

        let (_memory, probe, stats) = rig.stop().await;
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.init_failures, 4);
        assert!(probe.connect_count() >= 6);
    }
}
