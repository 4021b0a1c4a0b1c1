#![forbid(unsafe_code)]

//! The bridge: command dispatch onto proxies and event routing back out.
//!
//! All proxy mutation happens on one UI-affinity thread, the thread the
//! bridge was constructed on. Mutating entry points verify the calling
//! thread and fail with [`CommandError::OffAffinityThread`] otherwise;
//! other threads post commands through a [`BridgeHandle`] and the affinity
//! thread drains them with [`Bridge::run_pending`]. Redispatch is
//! fire-and-forget: failures of posted commands are logged, not returned,
//! unless the poster asked for a completion callback.

use core::fmt;
use std::sync::mpsc;
use std::thread::{self, ThreadId};

use ahash::AHashMap;
use mezzo_backend::NativeFactory;
use mezzo_core::{ProxyId, Size, ViewId};
use mezzo_proxy::{
    BindingState, PlainProxy, ProxyError, RangePolicy, RegistryError, ScrollProxy, SliderProxy,
    StackProxy,
};
use serde_json::Value;
use tracing::warn;

use crate::command::{ArgumentError, Command};
use crate::event::{ChangeEvent, EventSink};

/// Failure of one dispatched command.
#[derive(Debug)]
pub enum CommandError {
    Argument(ArgumentError),
    UnknownProxy { proxy: ProxyId },
    TargetMismatch { proxy: ProxyId, expected: &'static str },
    Proxy(ProxyError),
    OffAffinityThread,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Argument(err) => err.fmt(f),
            Self::UnknownProxy { proxy } => write!(f, "no proxy with id {}", proxy.get()),
            Self::TargetMismatch { proxy, expected } => {
                write!(f, "proxy {} is not a {expected}", proxy.get())
            }
            Self::Proxy(err) => err.fmt(f),
            Self::OffAffinityThread => {
                write!(f, "proxy mutation attempted off the UI-affinity thread")
            }
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Argument(err) => Some(err),
            Self::Proxy(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ArgumentError> for CommandError {
    fn from(err: ArgumentError) -> Self {
        Self::Argument(err)
    }
}

impl From<ProxyError> for CommandError {
    fn from(err: ProxyError) -> Self {
        Self::Proxy(err)
    }
}

/// One registered proxy of any flavor.
#[derive(Debug)]
pub enum ProxyNode {
    Stack(StackProxy),
    Slider(SliderProxy),
    Scroll(ScrollProxy),
    Plain(PlainProxy),
}

impl ProxyNode {
    fn id(&self) -> ProxyId {
        match self {
            Self::Stack(node) => node.id(),
            Self::Slider(node) => node.id(),
            Self::Scroll(node) => node.id(),
            Self::Plain(node) => node.id(),
        }
    }

    pub fn state(&self) -> BindingState {
        match self {
            Self::Stack(node) => node.base().state(),
            Self::Slider(node) => node.base().state(),
            Self::Scroll(node) => node.base().state(),
            Self::Plain(node) => node.base().state(),
        }
    }

    fn realize(&mut self, factory: &mut dyn NativeFactory) -> Result<ViewId, ProxyError> {
        match self {
            Self::Stack(node) => node.realize(factory),
            Self::Slider(node) => node.realize(factory),
            Self::Scroll(node) => node.realize(factory),
            Self::Plain(node) => Ok(node.realize(factory)?),
        }
    }

    fn detach(&mut self) -> Result<(), ProxyError> {
        match self {
            Self::Stack(node) => node.detach(),
            Self::Slider(node) => node.detach(),
            Self::Scroll(node) => node.detach(),
            Self::Plain(node) => Ok(node.detach()?),
        }
    }

    fn destroy(&mut self) -> Result<(), ProxyError> {
        match self {
            Self::Stack(node) => node.destroy(),
            Self::Slider(node) => node.destroy(),
            Self::Scroll(node) => node.destroy(),
            Self::Plain(node) => Ok(node.destroy()?),
        }
    }
}

/// A command posted from off the affinity thread.
struct RemoteCommand {
    target: ProxyId,
    name: String,
    args: Value,
    completion: Option<Box<dyn FnOnce() + Send>>,
}

/// Cloneable, `Send` poster for cross-thread command redispatch.
#[derive(Clone)]
pub struct BridgeHandle {
    tx: mpsc::Sender<RemoteCommand>,
}

impl BridgeHandle {
    /// Queue a command for the affinity thread. Fire-and-forget: the result
    /// is not reported back, and posting after the bridge is gone is a
    /// silent no-op.
    pub fn post(&self, target: ProxyId, name: impl Into<String>, args: Value) {
        let _ = self.tx.send(RemoteCommand {
            target,
            name: name.into(),
            args,
            completion: None,
        });
    }

    /// Queue a command and run `completion` on the affinity thread once it
    /// has been processed, whether or not it succeeded.
    pub fn post_with_completion(
        &self,
        target: ProxyId,
        name: impl Into<String>,
        args: Value,
        completion: impl FnOnce() + Send + 'static,
    ) {
        let _ = self.tx.send(RemoteCommand {
            target,
            name: name.into(),
            args,
            completion: Some(Box::new(completion)),
        });
    }
}

/// Owner of the proxy table and the single dispatch path into it.
pub struct Bridge {
    factory: Box<dyn NativeFactory>,
    nodes: AHashMap<ProxyId, ProxyNode>,
    affinity: ThreadId,
    remote_tx: mpsc::Sender<RemoteCommand>,
    remote_rx: mpsc::Receiver<RemoteCommand>,
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("proxies", &self.nodes.len())
            .field("affinity", &self.affinity)
            .finish_non_exhaustive()
    }
}

impl Bridge {
    /// The constructing thread becomes the UI-affinity thread.
    pub fn new(factory: Box<dyn NativeFactory>) -> Self {
        let (remote_tx, remote_rx) = mpsc::channel();
        Self {
            factory,
            nodes: AHashMap::new(),
            affinity: thread::current().id(),
            remote_tx,
            remote_rx,
        }
    }

    pub fn handle(&self) -> BridgeHandle {
        BridgeHandle {
            tx: self.remote_tx.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, proxy: ProxyId) -> bool {
        self.nodes.contains_key(&proxy)
    }

    pub fn node(&self, proxy: ProxyId) -> Option<&ProxyNode> {
        self.nodes.get(&proxy)
    }

    fn ensure_affinity(&self) -> Result<(), CommandError> {
        if thread::current().id() == self.affinity {
            Ok(())
        } else {
            Err(CommandError::OffAffinityThread)
        }
    }

    /// Register an already-built proxy; returns its script-visible id.
    pub fn register(&mut self, node: ProxyNode) -> Result<ProxyId, CommandError> {
        self.ensure_affinity()?;
        let id = node.id();
        self.nodes.insert(id, node);
        Ok(id)
    }

    pub fn register_stack(&mut self) -> Result<ProxyId, CommandError> {
        self.register(ProxyNode::Stack(StackProxy::new()))
    }

    pub fn register_slider(
        &mut self,
        min: f64,
        max: f64,
        policy: RangePolicy,
    ) -> Result<ProxyId, CommandError> {
        self.register(ProxyNode::Slider(SliderProxy::new(min, max, policy)))
    }

    pub fn register_scroll(
        &mut self,
        viewport: Size,
        zoom_bounds: (f64, f64),
    ) -> Result<ProxyId, CommandError> {
        self.register(ProxyNode::Scroll(ScrollProxy::new(viewport, zoom_bounds)))
    }

    pub fn register_plain(&mut self, type_name: &'static str) -> Result<ProxyId, CommandError> {
        self.register(ProxyNode::Plain(PlainProxy::new(type_name)))
    }

    fn stack_mut<'a>(
        nodes: &'a mut AHashMap<ProxyId, ProxyNode>,
        proxy: ProxyId,
    ) -> Result<&'a mut StackProxy, CommandError> {
        match nodes.get_mut(&proxy) {
            None => Err(CommandError::UnknownProxy { proxy }),
            Some(ProxyNode::Stack(node)) => Ok(node),
            Some(_) => Err(CommandError::TargetMismatch {
                proxy,
                expected: "stack container",
            }),
        }
    }

    fn slider_mut<'a>(
        nodes: &'a mut AHashMap<ProxyId, ProxyNode>,
        proxy: ProxyId,
    ) -> Result<&'a mut SliderProxy, CommandError> {
        match nodes.get_mut(&proxy) {
            None => Err(CommandError::UnknownProxy { proxy }),
            Some(ProxyNode::Slider(node)) => Ok(node),
            Some(_) => Err(CommandError::TargetMismatch {
                proxy,
                expected: "slider control",
            }),
        }
    }

    fn scroll_mut<'a>(
        nodes: &'a mut AHashMap<ProxyId, ProxyNode>,
        proxy: ProxyId,
    ) -> Result<&'a mut ScrollProxy, CommandError> {
        match nodes.get_mut(&proxy) {
            None => Err(CommandError::UnknownProxy { proxy }),
            Some(ProxyNode::Scroll(node)) => Ok(node),
            Some(_) => Err(CommandError::TargetMismatch {
                proxy,
                expected: "scrollable surface",
            }),
        }
    }

    /// Realize a child proxy (any flavor) so it can be arranged.
    fn realize_child(&mut self, child: ProxyId) -> Result<ViewId, CommandError> {
        let node = self
            .nodes
            .get_mut(&child)
            .ok_or(CommandError::UnknownProxy { proxy: child })?;
        node.realize(self.factory.as_mut()).map_err(CommandError::Proxy)
    }

    /// Registry preconditions checked before the child is realized. A
    /// command that cannot succeed must leave the child untouched.
    fn check_arrangeable(
        stack: &StackProxy,
        child: ProxyId,
        index: usize,
    ) -> Result<(), CommandError> {
        if stack.position_of(child).is_some() {
            return Err(ProxyError::Registry(RegistryError::DuplicateChild { child }).into());
        }
        let len = stack.arranged().len();
        if index > len {
            return Err(ProxyError::Registry(RegistryError::IndexOutOfRange { index, len }).into());
        }
        Ok(())
    }

    /// Drop `child` from every stack that still arranges it, so no registry
    /// holds on to a view identity that is about to die.
    fn orphan_from_parents(&mut self, child: ProxyId) -> Result<(), CommandError> {
        let parents: Vec<ProxyId> = self
            .nodes
            .iter()
            .filter_map(|(id, node)| match node {
                ProxyNode::Stack(stack) if stack.position_of(child).is_some() => Some(*id),
                _ => None,
            })
            .collect();
        for parent in parents {
            let stack = Self::stack_mut(&mut self.nodes, parent)?;
            stack.remove_arranged(child, self.factory.as_mut())?;
        }
        Ok(())
    }

    /// Decode and apply one scripted command on the affinity thread.
    pub fn dispatch(
        &mut self,
        target: ProxyId,
        name: &str,
        args: &Value,
        sink: &mut dyn EventSink,
    ) -> Result<(), CommandError> {
        self.ensure_affinity()?;
        let command = Command::decode(name, args)?;
        self.apply(target, command, sink)
    }

    fn apply(
        &mut self,
        target: ProxyId,
        command: Command,
        sink: &mut dyn EventSink,
    ) -> Result<(), CommandError> {
        match command {
            Command::AddArrangedSubview { child } => {
                let stack = Self::stack_mut(&mut self.nodes, target)?;
                let end = stack.arranged().len();
                Self::check_arrangeable(stack, child, end)?;
                let view = self.realize_child(child)?;
                let stack = Self::stack_mut(&mut self.nodes, target)?;
                stack.add_arranged(child, view, self.factory.as_mut())?;
            }
            Command::InsertArrangedSubview { child, index } => {
                let stack = Self::stack_mut(&mut self.nodes, target)?;
                Self::check_arrangeable(stack, child, index)?;
                let view = self.realize_child(child)?;
                let stack = Self::stack_mut(&mut self.nodes, target)?;
                stack.insert_arranged_at(child, view, index, self.factory.as_mut())?;
            }
            Command::RemoveArrangedSubview { child } => {
                let stack = Self::stack_mut(&mut self.nodes, target)?;
                stack.remove_arranged(child, self.factory.as_mut())?;
            }
            Command::SetCustomSpacing { spacing, after } => {
                let stack = Self::stack_mut(&mut self.nodes, target)?;
                stack.set_custom_spacing(spacing, after, self.factory.as_mut())?;
            }
            Command::SetSpacing { spacing } => {
                let stack = Self::stack_mut(&mut self.nodes, target)?;
                stack.set_base_spacing(spacing, self.factory.as_mut())?;
            }
            Command::SetAxis { axis } => {
                let stack = Self::stack_mut(&mut self.nodes, target)?;
                stack.set_axis(axis, self.factory.as_mut())?;
            }
            Command::SetContentOffset { offset, animated } => {
                let scroll = Self::scroll_mut(&mut self.nodes, target)?;
                let moved = scroll.set_content_offset(offset, animated, self.factory.as_mut())?;
                if let Some(offset) = moved {
                    sink.emit(ChangeEvent::ContentOffsetChanged { proxy: target, offset });
                }
            }
            Command::SetContentInsets { insets, animated } => {
                let scroll = Self::scroll_mut(&mut self.nodes, target)?;
                let moved = scroll.set_content_insets(insets, animated, self.factory.as_mut())?;
                if let Some(offset) = moved {
                    sink.emit(ChangeEvent::ContentOffsetChanged { proxy: target, offset });
                }
            }
            Command::SetZoomScale { scale, animated } => {
                let scroll = Self::scroll_mut(&mut self.nodes, target)?;
                let moved = scroll.set_zoom_scale(scale, animated, self.factory.as_mut())?;
                if let Some(offset) = moved {
                    sink.emit(ChangeEvent::ContentOffsetChanged { proxy: target, offset });
                }
            }
            Command::ScrollToTop { animated } => {
                let scroll = Self::scroll_mut(&mut self.nodes, target)?;
                let moved = scroll.scroll_to_top(animated, self.factory.as_mut())?;
                if let Some(offset) = moved {
                    sink.emit(ChangeEvent::ContentOffsetChanged { proxy: target, offset });
                }
            }
            Command::ScrollToBottom { animated } => {
                let scroll = Self::scroll_mut(&mut self.nodes, target)?;
                let moved = scroll.scroll_to_bottom(animated, self.factory.as_mut())?;
                if let Some(offset) = moved {
                    sink.emit(ChangeEvent::ContentOffsetChanged { proxy: target, offset });
                }
            }
            Command::SetValue { value, animated } => {
                let slider = Self::slider_mut(&mut self.nodes, target)?;
                if let Some(change) = slider.set_value(value, animated)? {
                    sink.emit(ChangeEvent::ValueChanged {
                        proxy: target,
                        value: change.reported,
                        from_user: change.from_user,
                    });
                }
            }
            Command::SetSteps { config } => {
                Self::slider_mut(&mut self.nodes, target)?.configure_steps(config)?;
            }
            Command::SetSnapToSteps { snap } => {
                Self::slider_mut(&mut self.nodes, target)?.set_snap(snap)?;
            }
            Command::SetStepValues { step_values } => {
                Self::slider_mut(&mut self.nodes, target)?.set_step_values(step_values)?;
            }
            Command::Detach => {
                let realized = self
                    .nodes
                    .get(&target)
                    .ok_or(CommandError::UnknownProxy { proxy: target })?
                    .state()
                    == BindingState::Realized;
                // A detach that is going to fail must not touch parents.
                if realized {
                    self.orphan_from_parents(target)?;
                }
                self.nodes
                    .get_mut(&target)
                    .ok_or(CommandError::UnknownProxy { proxy: target })?
                    .detach()?;
            }
            Command::Destroy => {
                if !self.nodes.contains_key(&target) {
                    return Err(CommandError::UnknownProxy { proxy: target });
                }
                self.orphan_from_parents(target)?;
                self.nodes
                    .get_mut(&target)
                    .ok_or(CommandError::UnknownProxy { proxy: target })?
                    .destroy()?;
                self.nodes.remove(&target);
            }
        }
        Ok(())
    }

    /// Native slider input (e.g. a thumb drag) entering from the toolkit.
    pub fn slider_input(
        &mut self,
        proxy: ProxyId,
        raw: f64,
        sink: &mut dyn EventSink,
    ) -> Result<(), CommandError> {
        self.ensure_affinity()?;
        let slider = Self::slider_mut(&mut self.nodes, proxy)?;
        if let Some(change) = slider.native_input(raw)? {
            sink.emit(ChangeEvent::ValueChanged {
                proxy,
                value: change.reported,
                from_user: change.from_user,
            });
        }
        Ok(())
    }

    /// Toolkit callback: an animated scroll transition completed.
    pub fn transition_finished(
        &mut self,
        proxy: ProxyId,
        generation: u64,
        sink: &mut dyn EventSink,
    ) -> Result<(), CommandError> {
        self.ensure_affinity()?;
        let scroll = Self::scroll_mut(&mut self.nodes, proxy)?;
        if let Some(offset) = scroll.finish_transition(generation) {
            sink.emit(ChangeEvent::ContentOffsetChanged { proxy, offset });
        }
        Ok(())
    }

    /// Drain commands posted from other threads. Returns how many were
    /// processed; individual failures are logged, and completions run either
    /// way.
    pub fn run_pending(&mut self, sink: &mut dyn EventSink) -> Result<usize, CommandError> {
        self.ensure_affinity()?;
        let mut processed = 0;
        while let Ok(command) = self.remote_rx.try_recv() {
            if let Err(err) = self.dispatch(command.target, &command.name, &command.args, sink) {
                warn!(
                    target_proxy = command.target.get(),
                    command = %command.name,
                    error = %err,
                    "posted command failed"
                );
            }
            if let Some(completion) = command.completion {
                completion();
            }
            processed += 1;
        }
        Ok(processed)
    }
}
