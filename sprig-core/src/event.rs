//! 同步事件发布
//!
//! 监听器按注册顺序在发布线程上调用。监听器返回的错误和 panic 都交给错误处理器，
//! 没有错误处理器时写入日志，其余监听器照常收到事件。

use std::any::Any;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::anyhow;
use parking_lot::RwLock;

pub trait Event: Any + Send + Sync {
    fn event_name(&self) -> &str;

    fn timestamp(&self) -> SystemTime;

    fn as_any(&self) -> &dyn Any;
}

/// 事件监听器
pub trait EventListener: Send + Sync {
    fn on_event(&self, event: &dyn Event) -> anyhow::Result<()>;

    /// 用于日志和按名称移除
    fn listener_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// 返回 false 的事件不会分派给该监听器
    fn accepts(&self, event: &dyn Event) -> bool {
        let _ = event;
        true
    }
}

/// 只关心一种事件类型的监听器，通过 [`typed_listener`] 注册
pub trait TypedEventListener<E: Event>: Send + Sync {
    fn on_typed_event(&self, event: &E) -> anyhow::Result<()>;
}

struct TypedListener<E, L> {
    listener: Arc<L>,
    _event: PhantomData<fn(&E)>,
}

impl<E, L> EventListener for TypedListener<E, L>
where
    E: Event,
    L: TypedEventListener<E> + 'static,
{
    fn on_event(&self, event: &dyn Event) -> anyhow::Result<()> {
        match event.as_any().downcast_ref::<E>() {
            Some(typed) => self.listener.on_typed_event(typed),
            None => Ok(()),
        }
    }

    fn listener_name(&self) -> &str {
        std::any::type_name::<L>()
    }

    fn accepts(&self, event: &dyn Event) -> bool {
        event.as_any().is::<E>()
    }
}

/// 把类型化监听器包装成 [`EventListener`]
pub fn typed_listener<E, L>(listener: Arc<L>) -> Arc<dyn EventListener>
where
    E: Event,
    L: TypedEventListener<E> + 'static,
{
    Arc::new(TypedListener::<E, L> {
        listener,
        _event: PhantomData,
    })
}

/// 参数依次为监听器名称、事件和失败原因
pub type ErrorHandler = Arc<dyn Fn(&str, &dyn Event, &anyhow::Error) + Send + Sync>;

pub trait ApplicationEventMulticaster: Send + Sync {
    fn add_listener(&self, listener: Arc<dyn EventListener>);

    /// 按名称移除，返回是否移除了监听器
    fn remove_listener(&self, listener_name: &str) -> bool;

    fn multicast_event(&self, event: Arc<dyn Event>);

    fn listener_count(&self) -> usize;
}

#[derive(Default)]
pub struct SimpleApplicationEventMulticaster {
    listeners: RwLock<Vec<Arc<dyn EventListener>>>,
    error_handler: Option<ErrorHandler>,
}

impl SimpleApplicationEventMulticaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str, &dyn Event, &anyhow::Error) + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    fn notify(&self, listener: &dyn EventListener, event: &dyn Event) {
        let error = match panic::catch_unwind(AssertUnwindSafe(|| listener.on_event(event))) {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e,
            Err(payload) => anyhow!("listener panicked: {}", panic_message(payload.as_ref())),
        };

        match &self.error_handler {
            Some(handler) => handler(listener.listener_name(), event, &error),
            None => tracing::error!(
                "Event listener '{}' failed on {}: {:#}",
                listener.listener_name(),
                event.event_name(),
                error
            ),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

impl ApplicationEventMulticaster for SimpleApplicationEventMulticaster {
    fn add_listener(&self, listener: Arc<dyn EventListener>) {
        tracing::debug!("Registered event listener {}", listener.listener_name());
        self.listeners.write().push(listener);
    }

    fn remove_listener(&self, listener_name: &str) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|listener| listener.listener_name() != listener_name);
        listeners.len() != before
    }

    fn multicast_event(&self, event: Arc<dyn Event>) {
        // 分派时不持有锁，监听器可以注册新的监听器
        let targets: Vec<Arc<dyn EventListener>> = self
            .listeners
            .read()
            .iter()
            .filter(|listener| listener.accepts(event.as_ref()))
            .cloned()
            .collect();

        tracing::trace!("Publishing {} to {} listener(s)", event.event_name(), targets.len());
        for listener in &targets {
            self.notify(listener.as_ref(), event.as_ref());
        }
    }

    fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}
