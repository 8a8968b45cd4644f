use thiserror::Error;

/// A guard refusal. The display text is the human-readable reason shown to
/// the player; rejected actions never mutate state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    // Turn and phase gating
    #[error("not your turn")]
    NotYourTurn,
    #[error("action is not allowed in the current phase")]
    WrongPhase,
    #[error("you must resolve your pending decision first")]
    PendingDecision,
    #[error("the current player must resolve a pending decision first")]
    OpponentPending,
    #[error("no matching pending decision to resolve")]
    NoPendingDecision,
    #[error("both actions for this turn have been taken")]
    ActionsExhausted,
    #[error("no action taken yet, pass instead of skipping")]
    SkipWithoutAction,
    #[error("an action was already taken this turn, skip instead of passing")]
    PassAfterAction,
    #[error("already passed this generation")]
    AlreadyPassed,

    // Payment
    #[error("cannot afford the cost of {cost}")]
    CannotAfford { cost: u32 },
    #[error("payment is ambiguous, an explicit allocation is required")]
    AmbiguousPayment,
    #[error("payment uses resources that are not accepted here")]
    UnusableResource,
    #[error("payment exceeds available resources")]
    PaymentExceedsStock,
    #[error("payment does not cover the cost of {cost}")]
    PaymentShort { cost: u32 },
    #[error("payment overshoots the cost")]
    ExcessivePayment,

    // Cards
    #[error("unknown card {0}")]
    UnknownCard(String),
    #[error("card {0} is not in your hand")]
    CardNotInHand(String),
    #[error("card {0} is not in play")]
    CardNotPlayed(String),
    #[error("card action was already used this generation")]
    CardAlreadyActivated,
    #[error("card has no action")]
    NoCardAction,
    #[error("invalid action choice")]
    InvalidChoice,
    #[error("card is not part of the current offer")]
    NotInOffer,
    #[error("global requirements not met: {0}")]
    RequirementNotMet(String),
    #[error("production cannot be reduced below its floor")]
    NotEnoughProduction,
    #[error("not enough resources")]
    NotEnoughResources,

    // Global parameters
    #[error("temperature is already at its maximum")]
    TemperatureAtMaximum,
    #[error("oxygen is already at its maximum")]
    OxygenAtMaximum,
    #[error("all oceans have already been placed")]
    OceansAtMaximum,

    // Milestones and awards
    #[error("milestone has already been claimed")]
    MilestoneAlreadyClaimed,
    #[error("three milestones have already been claimed")]
    MilestonesExhausted,
    #[error("milestone requirements not met")]
    MilestoneNotReached,
    #[error("award has already been funded")]
    AwardAlreadyFunded,
    #[error("all award tiers have been funded")]
    AwardsExhausted,

    // Colonies
    #[error("colonies are not enabled in this game")]
    ColoniesDisabled,
    #[error("unknown colony {0}")]
    UnknownColony(String),
    #[error("colony is not active yet")]
    ColonyInactive,
    #[error("colony already has three settlers")]
    ColonyFull,
    #[error("you already have a colony there")]
    AlreadySettled,
    #[error("colony has already been traded with this generation")]
    ColonyAlreadyTraded,
    #[error("no trade fleet available this generation")]
    NoFleetAvailable,

    // Turmoil
    #[error("turmoil is not enabled in this game")]
    TurmoilDisabled,

    // Board
    #[error("cell is not on the board")]
    OffBoard,
    #[error("cell is already occupied")]
    CellOccupied,
    #[error("cell is reserved for oceans")]
    OceanReservedCell,
    #[error("oceans may only be placed on reserved cells")]
    NotOceanReserved,
    #[error("cities may not be placed adjacent to another city")]
    CityAdjacency,
    #[error("greeneries must be placed adjacent to your own tiles when possible")]
    GreeneryAdjacency,

    // Resolutions
    #[error("wrong number of cards discarded")]
    WrongDiscardCount,
    #[error("invalid target for this resource choice")]
    InvalidTarget,
    #[error("corporation has already been chosen")]
    CorporationAlreadyChosen,
    #[error("unknown corporation {0}")]
    UnknownCorporation(String),
}

/// Internal inconsistencies. These indicate a programming defect, never bad
/// player input, and fail the whole request loudly. The caller's copy of
/// state stays untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("seat {0} is out of range")]
    SeatOutOfRange(u8),
    #[error("card id {0} is out of catalog bounds")]
    CardIdOutOfBounds(u16),
    #[error("corporation id {0} is out of catalog bounds")]
    CorpIdOutOfBounds(u16),
    #[error("colony id {0} is out of catalog bounds")]
    ColonyIdOutOfBounds(u16),
    #[error("pending decision references card {0} which is no longer available")]
    PendingCardMissing(String),
    #[error("resource debit failed after guard approval")]
    ResourceUnderflow,
    #[error("production adjustment failed after guard approval")]
    ProductionUnderflow,
    #[error("global parameter raised past its maximum")]
    ParameterOverflow,
    #[error("forced action queue references an impossible task")]
    QueueCorrupt,
}

/// Errors surfaced by one dispatch call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error(transparent)]
    Illegal(#[from] ActionError),
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

/// Re-hydration failures when loading a compact snapshot against the
/// catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("unknown card {0}")]
    UnknownCard(String),
    #[error("unknown corporation {0}")]
    UnknownCorporation(String),
    #[error("unknown colony {0}")]
    UnknownColony(String),
    #[error("malformed state: {0}")]
    Malformed(String),
}
