//! 前台服务与顺序器之间的桥
//!
//! ExoPlayer 和通知栏留在 Java 侧；这里只运行顺序器，
//! 每个事件产生的指令按顺序返回给服务执行。

use crossbeam_channel::Receiver;
use reel_player::{
    directive_channel, BatchSource, ChannelPlayer, ChannelPresentation, Directive, LoadRequest,
    PlaylistSequencer, SequencerEvent, SingleSource,
};

pub struct BridgeService {
    sequencer: PlaylistSequencer<ChannelPlayer, ChannelPresentation>,
    directives: Receiver<Directive>,
}

impl Default for BridgeService {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeService {
    pub fn new() -> Self {
        let (player, presentation, directives) = directive_channel();
        Self {
            sequencer: PlaylistSequencer::new(player, presentation),
            directives,
        }
    }

    /// 处理一个事件，返回服务需要执行的指令
    pub fn handle(&mut self, event: SequencerEvent) -> Vec<Directive> {
        self.sequencer.dispatch(event);
        self.directives.try_iter().collect()
    }

    /// 播放器回报的 isPlaying 变化
    pub fn set_playing(&mut self, playing: bool) {
        self.sequencer.player_mut().set_playing(playing);
    }
}

/// 由 Intent extras 组装加载请求
///
/// 三个数组都存在时才构成批量形式；单条目形式需要 `uri`。
pub fn load_request(
    ids: Option<Vec<i64>>,
    uris: Option<Vec<String>>,
    titles: Option<Vec<String>>,
    id: i64,
    uri: Option<String>,
    title: Option<String>,
) -> LoadRequest {
    let batch = match (ids, uris, titles) {
        (Some(ids), Some(locators), Some(titles)) => Some(BatchSource {
            ids,
            locators,
            titles,
        }),
        _ => None,
    };

    let single = uri.map(|locator| SingleSource {
        id: Some(id),
        locator,
        title,
    });

    LoadRequest { single, batch }
}

pub fn directives_json(directives: &[Directive]) -> String {
    serde_json::to_string(directives).unwrap_or_else(|e| {
        log::warn!("cannot encode directives: {}", e);
        "[]".to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_player::ResolvedLoad;

    fn load_three(service: &mut BridgeService) -> Vec<Directive> {
        service.handle(SequencerEvent::Load(LoadRequest::batch(
            vec![11, 12, 13],
            vec![
                "content://media/external/video/media/11".into(),
                "content://media/external/video/media/12".into(),
                "content://media/external/video/media/13".into(),
            ],
            vec!["a.mp4".into(), "b.mp4".into(), "c.mp4".into()],
        )))
    }

    #[test]
    fn test_load_emits_play_sequence() {
        let mut service = BridgeService::new();
        let directives = load_three(&mut service);

        assert_eq!(directives.first(), Some(&Directive::Stop));
        assert!(directives.contains(&Directive::Play));
        assert_eq!(
            directives.last(),
            Some(&Directive::Publish {
                title: "a.mp4".into(),
                subtitle: "Video 1 of 3".into()
            })
        );
    }

    #[test]
    fn test_play_pause_follows_host_state() {
        let mut service = BridgeService::new();
        load_three(&mut service);

        // 服务回报播放器实际已暂停
        service.set_playing(false);
        assert_eq!(
            service.handle(SequencerEvent::PlayPause),
            vec![Directive::Play]
        );

        assert_eq!(
            service.handle(SequencerEvent::PlayPause),
            vec![Directive::Pause]
        );
    }

    #[test]
    fn test_end_of_playlist_tears_down() {
        let mut service = BridgeService::new();
        load_three(&mut service);
        service.handle(SequencerEvent::Ended);
        service.handle(SequencerEvent::Error("source error".into()));

        let last = service.handle(SequencerEvent::Ended);
        assert_eq!(last, vec![Directive::Stop, Directive::Teardown]);
    }

    #[test]
    fn test_single_load_carries_id() {
        let request = load_request(
            None,
            None,
            None,
            42,
            Some("content://media/external/video/media/42".into()),
            Some("clip.mp4".into()),
        );

        match request.resolve().unwrap() {
            ResolvedLoad::Single(item) => {
                assert_eq!(item.id(), 42);
                assert_eq!(item.title(), "clip.mp4");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_partial_arrays_fall_back_to_single() {
        let request = load_request(
            Some(vec![1, 2]),
            None,
            Some(vec!["a".into(), "b".into()]),
            7,
            Some("/x.mp4".into()),
            None,
        );
        assert!(request.batch.is_none());

        let mut service = BridgeService::new();
        let directives = service.handle(SequencerEvent::Load(request));
        assert!(directives.contains(&Directive::SetSource {
            locator: "/x.mp4".into(),
            title: reel_player::DEFAULT_TITLE.into()
        }));
    }

    #[test]
    fn test_json_array() {
        let json = directives_json(&[Directive::Pause, Directive::Teardown]);
        assert_eq!(json, r#"[{"op":"pause"},{"op":"teardown"}]"#);
        assert_eq!(directives_json(&[]), "[]");
    }
}
