//! The session tick loop. Mirrors the browser render loop's cadence without
//! any rendering: each tick drains the deferred queue into the backend,
//! refreshes the heap sample, evaluates the policy, queues the resulting
//! plan for the next tick, and runs the distance-culling pass.

use glam::Vec3;
use log::info;

use vista_quality::{
    apply_layer_budget, DeferredQueue, DeviceClass, DistanceCuller, HeapMonitor, MemorySampler,
    QualityController, SizeClass, Viewport,
};
use vista_scene::{LayerSet, ModelProfile, ModelStats};

use crate::backend::SceneBackend;
use crate::report::{ActionRecord, SessionReport};

/// The headless stand-in for the orbiting camera; far enough out that the
/// distance culler has something to do on spread-out scenes.
const CAMERA_POSITION: Vec3 = Vec3::new(0.0, 0.0, 30.0);

pub struct SessionConfig {
    pub ticks: u32,
    pub tick_ms: u64,
    pub viewport: Viewport,
    pub device: DeviceClass,
    pub disable_aggressive_at: Option<u32>,
    pub enable_aggressive_at: Option<u32>,
    pub layer_budget: Option<usize>,
}

pub struct Session {
    backend: SceneBackend,
    controller: QualityController,
    sampler: MemorySampler<Box<dyn HeapMonitor>>,
    queue: DeferredQueue,
    culler: Option<DistanceCuller>,
    config: SessionConfig,
    scene_name: String,
}

impl Session {
    pub fn new(
        backend: SceneBackend,
        profile: ModelProfile,
        monitor: Box<dyn HeapMonitor>,
        config: SessionConfig,
    ) -> Self {
        let scene_name = backend
            .graph()
            .node(vista_scene::SceneGraph::ROOT)
            .map(|n| n.name.clone())
            .unwrap_or_default();
        let controller = QualityController::new(profile, config.device);
        let sampler = MemorySampler::new(monitor, config.device);
        let culler = DistanceCuller::new(SizeClass::from_profile(&profile));
        Session {
            backend,
            controller,
            sampler,
            queue: DeferredQueue::new(),
            culler,
            config,
            scene_name,
        }
    }

    pub fn run(mut self) -> SessionReport {
        let mut records: Vec<ActionRecord> = Vec::new();

        let hidden_layers = match self.config.layer_budget {
            Some(budget) => {
                let layers = LayerSet::from_graph(self.backend.graph());
                apply_layer_budget(&mut self.backend, &layers, budget)
            }
            None => 0,
        };

        for tick in 0..self.config.ticks {
            let now_ms = u64::from(tick) * self.config.tick_ms;

            // User toggles land before anything else and cancel in-flight
            // deferred work.
            if self.config.disable_aggressive_at == Some(tick) {
                info!("tick {tick}: aggressive optimizations disabled by user");
                self.queue.clear();
                if let Some(culler) = self.culler.as_mut() {
                    culler.clear();
                }
                let plan = self.controller.disable_aggressive();
                for outcome in self.controller.apply(&plan, &mut self.backend) {
                    records.push(ActionRecord::from_outcome(tick, outcome));
                }
            }
            if self.config.enable_aggressive_at == Some(tick) {
                info!("tick {tick}: aggressive optimizations re-enabled by user");
                let plan = self.controller.enable_aggressive();
                for outcome in self.controller.apply(&plan, &mut self.backend) {
                    records.push(ActionRecord::from_outcome(tick, outcome));
                }
            }

            // Heavy work queued on the previous tick runs now.
            while let Some(plan) = self.queue.next() {
                for outcome in self.controller.apply(&plan, &mut self.backend) {
                    records.push(ActionRecord::from_outcome(tick, outcome));
                }
            }

            self.sampler.poll(now_ms);
            let plan = self
                .controller
                .evaluate(self.sampler.latest(), self.config.viewport);
            self.queue.push(plan);

            if self.controller.state().aggressive_enabled {
                if let Some(culler) = self.culler.as_mut() {
                    culler.pass(&mut self.backend, CAMERA_POSITION);
                }
            }
        }

        // Let the final evaluation land instead of leaving it queued.
        while let Some(plan) = self.queue.next() {
            for outcome in self.controller.apply(&plan, &mut self.backend) {
                records.push(ActionRecord::from_outcome(self.config.ticks, outcome));
            }
        }

        let state = self.controller.state();
        SessionReport {
            scene: self.scene_name,
            device: self.config.device,
            ticks: self.config.ticks,
            final_level: state.level,
            applied_flags: state.applied_flags.iter().copied().collect(),
            aggressive_enabled: state.aggressive_enabled,
            pixel_ratio: self.backend.pixel_ratio(),
            shadow_mode: self.backend.shadow_mode(),
            canvas_scale: self.backend.canvas_scale(),
            gc_requests: self.backend.gc_requests(),
            hidden_meshes: self.backend.hidden_mesh_count(),
            culled_meshes: self.culler.as_ref().map_or(0, |c| c.culled_count()),
            hidden_layers,
            stats: ModelStats::from_graph(self.backend.graph()),
            actions: records,
        }
    }
}
