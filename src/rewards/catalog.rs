use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: u32,
    pub name: &'static str,
    pub description: &'static str,
    pub points_required: u64,
}

pub static REWARD_CATALOG: [Reward; 6] = [
    Reward {
        id: 1,
        name: "Get 10% OFF",
        description: "Redeem 100 eco-points and enjoy 10% discount on partner stores",
        points_required: 100,
    },
    Reward {
        id: 2,
        name: "Flat 20% OFF",
        description: "Use 200 eco-points to unlock 20% off on food & shopping deals",
        points_required: 200,
    },
    Reward {
        id: 3,
        name: "Save 30% Today",
        description: "Redeem 300 eco-points for a special 30% discount on select brands",
        points_required: 300,
    },
    Reward {
        id: 4,
        name: "Mega Deal: 50% OFF",
        description: "Use 500 eco-points to grab massive savings on exclusive offers",
        points_required: 500,
    },
    Reward {
        id: 5,
        name: "Free Delivery",
        description: "Redeem 150 eco-points and get free delivery on your next order",
        points_required: 150,
    },
    Reward {
        id: 6,
        name: "Buy 1 Get 1 Free",
        description: "Use 400 eco-points to enjoy BOGO deals on select items",
        points_required: 400,
    },
];

pub fn find_reward(reward_id: u32) -> Option<&'static Reward> {
    REWARD_CATALOG.iter().find(|reward| reward.id == reward_id)
}
