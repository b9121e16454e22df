//! 최악 손실 탐색 (리스크 워커).
//!
//! 한 심볼의 주문 손익 합은 가격에 대한 구간별 선형 함수이고, 꺾임점은
//! 각 주문의 손절/익절/트리거 가격뿐입니다. 워커는 현재 가격에서 출발해
//! 위/아래로 가장 가까운 꺾임점까지 이동하며 각 지점의 손익 합을 평가합니다.
//!
//! 꺾임점에 도달하면 작업 상태가 바뀝니다:
//! - 대기 주문의 트리거 → 체결 (활성)
//! - 활성 주문의 손절/익절 → 청산 (이후 평가에서 제외)
//!
//! 각 지점에서 위/아래 양쪽을 독립적으로 재귀 탐색하므로 가격이 오갔다가
//! 돌아오는 경로(휩소)도 평가됩니다. 모든 상태 전이는 주문 하나를
//! 활성화하거나 청산하므로 재귀 깊이는 주문 수의 두 배를 넘지 않습니다.
//!
//! 같은 `(가격, 주문 상태)`에 다른 경로로 도달하면 하위 탐색 결과가 같으므로
//! 메모이제이션합니다. 메모 값은 해당 노드 아래에서 발생한 실현 손익만
//! 반영하므로 경로와 무관합니다.

use crate::breakpoint::{next_breakpoint, Breakpoint, LegState};
use crate::config::RealizedPnlPolicy;
use crate::order::{ExposureOrder, PriceDirection};
use rust_decimal::Decimal;
use std::collections::HashMap;
use trader_core::Price;

/// 심볼 하나의 최악 손실 (호가 통화, 손실이 양수).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskBound {
    /// 유한한 최악 손실
    Bounded(Decimal),
    /// 손절로 막히지 않아 손실이 가격과 함께 무한히 커짐
    Unbounded,
}

impl RiskBound {
    /// 두 값 중 더 큰 리스크.
    pub fn max(self, other: RiskBound) -> RiskBound {
        match (self, other) {
            (RiskBound::Bounded(a), RiskBound::Bounded(b)) => RiskBound::Bounded(a.max(b)),
            _ => RiskBound::Unbounded,
        }
    }

    /// 유한한 값이면 반환합니다.
    pub fn bounded(&self) -> Option<Decimal> {
        match self {
            RiskBound::Bounded(value) => Some(*value),
            RiskBound::Unbounded => None,
        }
    }

    /// 손실이 무한한지 여부.
    pub fn is_unbounded(&self) -> bool {
        matches!(self, RiskBound::Unbounded)
    }

    /// 상위 노드에서 확정된 손익 `realized`를 반영합니다.
    fn after_realized(self, realized: Decimal) -> RiskBound {
        match self {
            RiskBound::Bounded(value) => RiskBound::Bounded(value - realized),
            RiskBound::Unbounded => RiskBound::Unbounded,
        }
    }
}

fn combine(current: Option<RiskBound>, candidate: RiskBound) -> Option<RiskBound> {
    Some(match current {
        Some(bound) => bound.max(candidate),
        None => candidate,
    })
}

/// 탐색 통계.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// 평가한 브레이크포인트 수
    pub breakpoints_evaluated: usize,
    /// 탐색한 노드 수 (메모 적중 제외)
    pub nodes_explored: usize,
    /// 메모 적중 수
    pub memo_hits: usize,
    /// 최대 재귀 깊이
    pub max_depth: usize,
}

/// 워크 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOutcome {
    /// 최악 손실
    pub worst_case: RiskBound,
    /// 브레이크포인트가 하나도 없어 현재 가격의 손익으로 대체했는지 여부
    pub evaluated_at_market: bool,
    pub stats: WalkStats,
}

type MemoKey = (Price, Vec<LegState>);

/// 한 심볼 주문 집합에 대한 최악 손실 탐색기.
///
/// 호출자의 주문은 빌려서 읽기만 하고, 활성/청산 상태는 내부 `Vec<LegState>`에만
/// 기록합니다.
pub struct RiskWalker<'a> {
    orders: &'a [ExposureOrder],
    policy: RealizedPnlPolicy,
    memo: HashMap<MemoKey, Option<RiskBound>>,
    stats: WalkStats,
}

impl<'a> RiskWalker<'a> {
    /// 새 워커를 생성합니다. `orders`는 같은 심볼이어야 합니다.
    pub fn new(orders: &'a [ExposureOrder], policy: RealizedPnlPolicy) -> Self {
        Self {
            orders,
            policy,
            memo: HashMap::new(),
            stats: WalkStats::default(),
        }
    }

    /// `market_price`에서 출발해 최악 손실을 계산합니다.
    ///
    /// 현재 가격이 이미 손절/익절을 지나친 활성 주문은 그 가격에서 청산된
    /// 것으로 보고 출발합니다. 브레이크포인트가 전혀 없고 손실이 유한하면
    /// 현재 가격에서의 손익을 결과로 사용합니다.
    pub fn run(mut self, market_price: Price) -> WalkOutcome {
        let (initial, settled) = self.settle_crossed(market_price);
        let explored = self.explore(market_price, initial.clone(), 0);

        let (worst_case, evaluated_at_market) = match explored {
            Some(bound) => (bound.after_realized(settled), false),
            None => (
                RiskBound::Bounded(-(self.live_payoff(&initial, market_price) + settled)),
                true,
            ),
        };

        WalkOutcome {
            worst_case,
            evaluated_at_market,
            stats: self.stats,
        }
    }

    /// 출발 상태와 출발 전에 확정된 손익.
    fn settle_crossed(&self, market_price: Price) -> (Vec<LegState>, Decimal) {
        let mut states = Vec::with_capacity(self.orders.len());
        let mut settled = Decimal::ZERO;

        for order in self.orders {
            let state = LegState::initial(order);
            match order.crossed_exit(market_price) {
                Some(level) if state == LegState::Active => {
                    settled += self.realized_at(order, level);
                    states.push(LegState::Closed);
                }
                _ => states.push(state),
            }
        }

        (states, settled)
    }

    /// 청산 시 정책에 따라 남기는 손익.
    fn realized_at(&self, order: &ExposureOrder, level: Price) -> Decimal {
        match self.policy {
            RealizedPnlPolicy::CarryForward => order.payoff(level, false, false),
            RealizedPnlPolicy::Discard => Decimal::ZERO,
        }
    }

    /// `price`, `states`에서 시작하는 하위 탐색의 최악 손실.
    /// 이 노드 이전에 실현된 손익은 포함하지 않습니다.
    fn explore(&mut self, price: Price, states: Vec<LegState>, depth: usize) -> Option<RiskBound> {
        let key = (price.normalize(), states);
        if let Some(cached) = self.memo.get(&key) {
            self.stats.memo_hits += 1;
            return *cached;
        }
        let states = &key.1;

        self.stats.nodes_explored += 1;
        self.stats.max_depth = self.stats.max_depth.max(depth);

        let mut worst: Option<RiskBound> = None;

        for direction in PriceDirection::BOTH {
            match next_breakpoint(self.orders, states, price, direction) {
                Some(breakpoint) => {
                    self.stats.breakpoints_evaluated += 1;

                    // 전이 전 작업 집합의 손익 (꺾임점에서는 고정 여부와 무관)
                    let here = RiskBound::Bounded(-self.live_payoff(states, breakpoint.price));
                    let (next_states, realized) = self.advance(states, &breakpoint);

                    let candidate = match self.explore(breakpoint.price, next_states, depth + 1) {
                        Some(deeper) => here.max(deeper.after_realized(realized)),
                        None => here,
                    };
                    worst = combine(worst, candidate);
                }
                None => {
                    if self.loss_unbounded(states, direction) {
                        worst = combine(worst, RiskBound::Unbounded);
                    }
                }
            }
        }

        self.memo.insert(key, worst);
        worst
    }

    /// 활성 주문들의 고정 없는 손익 합.
    fn live_payoff(&self, states: &[LegState], price: Price) -> Decimal {
        self.orders
            .iter()
            .zip(states)
            .filter(|(_, state)| **state == LegState::Active)
            .map(|(order, _)| order.payoff(price, false, false))
            .sum()
    }

    /// 브레이크포인트 통과 후의 상태와 그 시점에 확정된 손익.
    fn advance(&self, states: &[LegState], breakpoint: &Breakpoint) -> (Vec<LegState>, Decimal) {
        let mut next = states.to_vec();
        let index = breakpoint.order_index;

        let realized = match states[index] {
            LegState::Pending => {
                next[index] = LegState::Active;
                Decimal::ZERO
            }
            LegState::Active => {
                next[index] = LegState::Closed;
                self.realized_at(&self.orders[index], breakpoint.price)
            }
            LegState::Closed => Decimal::ZERO,
        };

        (next, realized)
    }

    /// 더 이상 꺾임점이 없는 방향으로 손실이 무한히 커지는지 확인합니다.
    fn loss_unbounded(&self, states: &[LegState], direction: PriceDirection) -> bool {
        let slope: Decimal = self
            .orders
            .iter()
            .zip(states)
            .filter(|(_, state)| **state == LegState::Active)
            .map(|(order, _)| order.slope())
            .sum();

        match direction {
            PriceDirection::Up => slope < Decimal::ZERO,
            PriceDirection::Down => slope > Decimal::ZERO,
        }
    }
}

/// 편의 함수: `orders`의 최악 손실을 계산합니다.
pub fn worst_case_loss(
    orders: &[ExposureOrder],
    market_price: Price,
    policy: RealizedPnlPolicy,
) -> WalkOutcome {
    RiskWalker::new(orders, policy).run(market_price)
}
