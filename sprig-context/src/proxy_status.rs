//! 早期引用代理状态
//!
//! 一次容器启动共享一个状态句柄。句柄可以廉价克隆，所有克隆共享同一个标志，
//! 代理创建器和它创建的每个代理都持有一份。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 是否正在创建早期引用代理
#[derive(Debug, Clone, Default)]
pub struct EarlyBeanReferenceProxyStatus {
    creating_early_proxies: Arc<AtomicBool>,
}

impl EarlyBeanReferenceProxyStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_creating_early_proxies(&self) -> bool {
        self.creating_early_proxies.load(Ordering::SeqCst)
    }

    pub fn set_creating_early_proxies(&self, creating: bool) {
        self.creating_early_proxies.store(creating, Ordering::SeqCst);
    }

    /// 在守卫存活期间打开标志，守卫释放时恢复之前的值
    pub fn enable(&self) -> ProxyStatusGuard {
        self.scoped(true)
    }

    /// 在守卫存活期间关闭标志，守卫释放时恢复之前的值
    pub fn suspend(&self) -> ProxyStatusGuard {
        self.scoped(false)
    }

    fn scoped(&self, creating: bool) -> ProxyStatusGuard {
        let previous = self.creating_early_proxies.swap(creating, Ordering::SeqCst);
        ProxyStatusGuard {
            status: self.clone(),
            previous,
        }
    }

    /// 两个句柄是否共享同一个标志
    pub fn shares_flag_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.creating_early_proxies, &other.creating_early_proxies)
    }
}

/// 恢复代理状态的 RAII 守卫
#[must_use = "the previous proxy status is restored when the guard is dropped"]
pub struct ProxyStatusGuard {
    status: EarlyBeanReferenceProxyStatus,
    previous: bool,
}

impl Drop for ProxyStatusGuard {
    fn drop(&mut self) {
        self.status.set_creating_early_proxies(self.previous);
    }
}
