// ABOUTME: In-memory container runtime with scripted failures.
// ABOUTME: Enforces name uniqueness and stop-before-remove like a real engine.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use swapd::runtime::{
    ContainerError, ContainerOps, ContainerSpec, ImageError, ImageOps, RegistryAuth,
};
use swapd::types::{ContainerId, ImageRef, InstanceName};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Pull,
    Run,
    List,
    Stop,
    Remove,
    Rename,
}

#[derive(Debug, Clone)]
pub struct FakeContainer {
    pub id: ContainerId,
    pub name: String,
    pub image: String,
    pub running: bool,
    pub labels: HashMap<String, String>,
}

/// What the fake should do instead of its normal behaviour.
enum Script {
    Fail(String),
    Kind(fn(String) -> ContainerError),
    Hang,
    /// The container disappears just before the call reaches the engine.
    Vanish,
}

#[derive(Default)]
struct State {
    containers: Vec<FakeContainer>,
    next_id: u64,
    calls: Vec<String>,
    scripts: HashMap<Op, VecDeque<Script>>,
}

#[derive(Default)]
pub struct FakeRuntime {
    state: Mutex<State>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an existing container.
    pub fn seed(&self, name: &str, image: &str, running: bool) -> ContainerId {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = ContainerId::new(format!("seed{:060}", state.next_id));
        state.containers.push(FakeContainer {
            id: id.clone(),
            name: name.to_string(),
            image: image.to_string(),
            running,
            labels: HashMap::new(),
        });
        id
    }

    /// Make the next `op` fail with a generic runtime error.
    pub fn fail_next(&self, op: Op, message: &str) {
        self.push(op, Script::Fail(message.to_string()));
    }

    /// Make the next `op` fail with a specific container error kind.
    pub fn fail_next_with(&self, op: Op, kind: fn(String) -> ContainerError) {
        self.push(op, Script::Kind(kind));
    }

    /// Make the target of the next `op` disappear before the call runs.
    pub fn vanish_next(&self, op: Op) {
        self.push(op, Script::Vanish);
    }

    /// Make the next `op` never return.
    pub fn hang_next(&self, op: Op) {
        self.push(op, Script::Hang);
    }

    fn push(&self, op: Op, script: Script) {
        self.state
            .lock()
            .scripts
            .entry(op)
            .or_default()
            .push_back(script);
    }

    pub fn containers(&self) -> Vec<FakeContainer> {
        self.state.lock().containers.clone()
    }

    pub fn named(&self, name: &str) -> Vec<FakeContainer> {
        self.containers()
            .into_iter()
            .filter(|c| c.name == name)
            .collect()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    /// First word of every call, in order.
    pub fn call_ops(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|c| c.split_whitespace().next().unwrap_or_default().to_string())
            .collect()
    }

    /// Record the call and take its script, if any.
    fn enter(&self, op: Op, call: String) -> Option<Script> {
        let mut state = self.state.lock();
        state.calls.push(call);
        state.scripts.get_mut(&op).and_then(|q| q.pop_front())
    }

    async fn scripted_container(script: Option<Script>) -> Result<(), ContainerError> {
        match script {
            None | Some(Script::Vanish) => Ok(()),
            Some(Script::Fail(message)) => Err(ContainerError::Runtime(message)),
            Some(Script::Kind(kind)) => Err(kind("scripted".to_string())),
            Some(Script::Hang) => std::future::pending().await,
        }
    }
}

#[async_trait]
impl ImageOps for FakeRuntime {
    async fn pull_image(
        &self,
        reference: &ImageRef,
        _auth: Option<&RegistryAuth>,
    ) -> Result<(), ImageError> {
        match self.enter(Op::Pull, format!("pull {}", reference)) {
            None => Ok(()),
            Some(Script::Fail(message)) => Err(ImageError::PullFailed(message)),
            Some(Script::Kind(_)) => Err(ImageError::NotFound(reference.to_string())),
            Some(Script::Hang) => std::future::pending().await,
            Some(Script::Vanish) => Ok(()),
        }
    }
}

#[async_trait]
impl ContainerOps for FakeRuntime {
    async fn run_detached(&self, spec: &ContainerSpec) -> Result<ContainerId, ContainerError> {
        let script = self.enter(Op::Run, format!("run {} {}", spec.name, spec.image));
        Self::scripted_container(script).await?;

        let mut state = self.state.lock();
        if state.containers.iter().any(|c| c.name == spec.name.as_str()) {
            return Err(ContainerError::NameInUse(spec.name.to_string()));
        }
        state.next_id += 1;
        let id = ContainerId::new(format!("new{:061}", state.next_id));
        state.containers.push(FakeContainer {
            id: id.clone(),
            name: spec.name.to_string(),
            image: spec.image.to_string(),
            running: true,
            labels: spec.labels.clone(),
        });
        Ok(id)
    }

    async fn list_by_name(&self, name: &InstanceName) -> Result<Vec<ContainerId>, ContainerError> {
        let script = self.enter(Op::List, format!("list {}", name));
        Self::scripted_container(script).await?;

        Ok(self
            .state
            .lock()
            .containers
            .iter()
            .filter(|c| c.name == name.as_str())
            .map(|c| c.id.clone())
            .collect())
    }

    async fn stop_container(
        &self,
        id: &ContainerId,
        _grace: Duration,
    ) -> Result<(), ContainerError> {
        let script = self.enter(Op::Stop, format!("stop {}", id));
        if matches!(script, Some(Script::Vanish)) {
            self.state.lock().containers.retain(|c| &c.id != id);
        }
        Self::scripted_container(script).await?;

        let mut state = self.state.lock();
        let container = state
            .containers
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        if !container.running {
            return Err(ContainerError::NotRunning(id.to_string()));
        }
        container.running = false;
        Ok(())
    }

    async fn remove_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        let script = self.enter(Op::Remove, format!("remove {}", id));
        if matches!(script, Some(Script::Vanish)) {
            self.state.lock().containers.retain(|c| &c.id != id);
        }
        Self::scripted_container(script).await?;

        let mut state = self.state.lock();
        let index = state
            .containers
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        if state.containers[index].running {
            return Err(ContainerError::StillRunning(id.to_string()));
        }
        state.containers.remove(index);
        Ok(())
    }

    async fn rename_container(
        &self,
        id: &ContainerId,
        new_name: &InstanceName,
    ) -> Result<(), ContainerError> {
        let script = self.enter(Op::Rename, format!("rename {} {}", id, new_name));
        Self::scripted_container(script).await?;

        let mut state = self.state.lock();
        if state
            .containers
            .iter()
            .any(|c| c.name == new_name.as_str() && &c.id != id)
        {
            return Err(ContainerError::NameInUse(new_name.to_string()));
        }
        let container = state
            .containers
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        container.name = new_name.to_string();
        Ok(())
    }
}
