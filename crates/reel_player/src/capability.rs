//! 外部能力抽象
//!
//! 顺序器只通过这两个 trait 与解码引擎、通知栏交互。

/// 播放能力：一次只持有一个媒体源
///
/// 所有调用都是即发即忘的，真正的就绪/结束/错误通过事件异步回报。
pub trait Player {
    /// 停止当前播放
    fn stop(&mut self);
    /// 清除已加载的媒体源
    fn clear(&mut self);
    /// 设置媒体源
    fn set_source(&mut self, locator: &str, title: &str);
    /// 准备媒体源
    fn prepare(&mut self);
    fn play(&mut self);
    fn pause(&mut self);
    fn is_playing(&self) -> bool;
}

/// 展示能力（通知栏 / 媒体会话），对顺序器只写
pub trait Presentation {
    /// 刷新正在播放的标题与副标题
    fn publish(&mut self, title: &str, subtitle: &str);
    /// 撤下通知并释放前台状态
    fn teardown(&mut self);
}
